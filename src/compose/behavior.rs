//! Runtime behavior flag resolution
//!
//! Every leaf flag is resolved independently: a partially specified behavior
//! block at any level never suppresses sibling flags from lower-priority
//! sources. Precedence per leaf: CLI argument > user params > selected
//! configuration > global document > built-in default.

use serde::Serialize;

use crate::args::{bool_arg, ArgSource};
use crate::compose::device::DeviceConfig;
use crate::document::{RawBehaviorConfig, RawConfigDocument};

/// Short-hand override map accepted at the composition entry point.
#[derive(Debug, Clone, Default)]
pub struct UserParams {
    /// Maps to `init.exposeGlobals`.
    pub init_globals: Option<bool>,
    /// Maps to `init.launchApp`.
    pub launch_app: Option<bool>,
    /// `reuse: true` negates `init.reinstallApp`.
    pub reuse: Option<bool>,
    /// Maps to `cleanup.shutdownDevice`.
    pub cleanup: Option<bool>,
}

/// Fully resolved behavior flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorConfig {
    pub init: InitBehavior,
    pub cleanup: CleanupBehavior,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitBehavior {
    pub expose_globals: bool,
    pub reinstall_app: bool,
    pub launch_app: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupBehavior {
    pub shutdown_device: bool,
}

/// Merge behavior flags from all four sources.
pub fn compose_behavior_config(
    args: &dyn ArgSource,
    device: &DeviceConfig,
    doc: &RawConfigDocument,
    user_params: Option<&UserParams>,
) -> BehaviorConfig {
    let device_behavior = device.behavior.as_ref();
    let doc_behavior = doc.behavior.as_ref();
    let params = user_params.cloned().unwrap_or_default();

    let file_leaf = |pick: fn(&RawBehaviorConfig) -> Option<bool>| {
        device_behavior.and_then(pick).or_else(|| doc_behavior.and_then(pick))
    };

    let expose_globals = params
        .init_globals
        .or_else(|| file_leaf(|b| b.init.as_ref()?.expose_globals))
        .unwrap_or(true);

    let reinstall_app = bool_arg(args, "reuse")
        .map(|reuse| !reuse)
        .or(params.reuse.map(|reuse| !reuse))
        .or_else(|| file_leaf(|b| b.init.as_ref()?.reinstall_app))
        .unwrap_or(true);

    let launch_app = params
        .launch_app
        .or_else(|| file_leaf(|b| b.init.as_ref()?.launch_app))
        .unwrap_or(true);

    let shutdown_device = bool_arg(args, "cleanup")
        .or(params.cleanup)
        .or_else(|| file_leaf(|b| b.cleanup.as_ref()?.shutdown_device))
        .unwrap_or(false);

    BehaviorConfig {
        init: InitBehavior {
            expose_globals,
            reinstall_app,
            launch_app,
        },
        cleanup: CleanupBehavior { shutdown_device },
    }
}
