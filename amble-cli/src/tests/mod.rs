//! Shared test harness modules for the amble CLI.

use super::*;

mod convert_unit;
mod helpers;
mod plan_steps;
