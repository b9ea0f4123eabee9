// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP delivery gateway for rendered diagrams.
//!
//! Serves stored artifacts at `GET /diagrams/{file_name}`, gated by an
//! optional process-wide access token, plus an unauthenticated `GET /healthz`.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AccessToken;
pub use server::{GatewayState, bind, router, serve};
