// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Diagrammer service.
//!
//! This crate provides the error taxonomy, the shared domain types
//! (requests, render outcomes, artifacts, classification results) and the
//! adapter traits that the renderer and its test doubles implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::DiagrammerError;
pub use types::{
    AdapterType, Artifact, ArtifactId, Background, ClassificationResult, DiagramFormat,
    DiagramKind, DiagramRequest, HealthStatus, RenderConfig, RenderOutcome, Theme,
};

pub use traits::{PluginAdapter, RendererAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_distinct_for_caller_and_service_failures() {
        let validation = DiagrammerError::Validation("too big".into());
        let syntax = DiagrammerError::Syntax {
            message: "Parse error on line 2".into(),
            attempts: 5,
        };
        let infra = DiagrammerError::Infrastructure {
            message: "mmdc not found".into(),
            source: None,
        };

        assert_eq!(validation.code(), "validation_error");
        assert_eq!(syntax.code(), "syntax_error");
        assert_eq!(infra.code(), "infrastructure_error");
        assert!(validation.is_caller_error());
        assert!(syntax.is_caller_error());
        assert!(!infra.is_caller_error());
    }

    #[test]
    fn diagrammer_error_has_all_variants() {
        let _config = DiagrammerError::Config("test".into());
        let _storage = DiagrammerError::storage(std::io::Error::other("test"));
        let _not_found = DiagrammerError::NotFound("diagram_1_x.svg".into());
        let _auth = DiagrammerError::Unauthorized;
        let _timeout = DiagrammerError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = DiagrammerError::Internal("test".into());
    }

    #[test]
    fn syntax_error_message_carries_attempts() {
        let err = DiagrammerError::Syntax {
            message: "Lexical error".into(),
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "diagram syntax error after 3 attempt(s): Lexical error"
        );
    }

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;

        for variant in [AdapterType::Renderer, AdapterType::Storage, AdapterType::Gateway] {
            let s = variant.to_string();
            assert_eq!(AdapterType::from_str(&s).unwrap(), variant);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_renderer_adapter<T: RendererAdapter>() {}
    }
}
