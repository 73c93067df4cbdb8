//! Taskflow Backend Library
//!
//! This library provides the core functionality for the Taskflow project
//! management service, including:
//! - Projects, sections, tasks and comments with role-based membership
//! - Rule-based automations triggered by domain events
//! - Persisted notifications pushed over WebSocket
//! - Saved reports, dashboard metrics and signed inbound webhooks
//! - User authentication and management

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod realtime;
pub mod repository;
pub mod schema;
pub mod services;
pub mod state;
