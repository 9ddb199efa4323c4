//! cfinfra provider abstraction
//!
//! This crate holds the provider-independent half of cfinfra: the
//! `CloudProvider` trait, the desired `ResourceSet`, planned `Action`s and the
//! `.cfinfra/state.json` state file.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  cfinfra CLI                     │
//! │        (plan / apply / destroy / state)          │
//! └─────────────────┬───────────────────────────────┘
//!                   │ ResourceSet + ProviderState
//! ┌─────────────────▼───────────────────────────────┐
//! │                cfinfra-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          trait CloudProvider              │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Plan/Action  │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │             cfinfra-cloudfoundry                 │
//! │   managers → Gateway → Cloud Controller v3       │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod error;
pub mod provider;
pub mod state;

// Re-exports
pub use action::{Action, ActionResult, ActionType, ApplyResult, Plan, PlanSummary};
pub use error::{CloudError, Result};
pub use provider::{AuthStatus, CloudProvider, ResourceConfig, ResourceSet};
pub use state::{
    GlobalState, ProviderState, ResourceState, ResourceStatus, StateLock, StateManager,
};
