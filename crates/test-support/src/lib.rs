//! Shared fixtures for the workspace's tests.

pub mod common;

pub mod support {
    pub mod tasks;
}
