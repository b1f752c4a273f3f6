//! Behaviour suites for the automation bridge.

mod support;
