//! Lifecycle notifications sent to the host test framework.

use std::future::Future;
use std::pin::Pin;

use crate::error::RunError;
use crate::node::{SuiteNode, TestNode};

/// Future resolving once the host has processed a notification.
///
/// Only the suite start acknowledgement is awaited; every other
/// acknowledgement is dropped without polling.
pub type Acknowledgement = Pin<Box<dyn Future<Output = ()>>>;

/// An already-resolved [`Acknowledgement`].
///
/// # Examples
///
/// ```
/// use gherkin_suite_adapter::acknowledged;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap_or_else(|e| panic!("{e}")).block_on(async {
/// acknowledged().await;
/// # });
/// ```
#[must_use]
pub fn acknowledged() -> Acknowledgement {
    Box::pin(std::future::ready(()))
}

/// A lifecycle transition, borrowed from the node it concerns.
#[derive(Debug, Clone, Copy)]
pub enum HostEvent<'a> {
    /// The suite is about to run its first test.
    SuiteStart(&'a SuiteNode),
    /// The suite finished; timing and error are final.
    SuiteEnd(&'a SuiteNode),
    /// A test opened.
    TestStart(&'a TestNode),
    /// A test closed; status, error and timing are final.
    TestEnd(&'a TestNode),
    /// The run failed.
    Error(&'a RunError),
}

impl HostEvent<'_> {
    /// Wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SuiteStart(_) => "suiteStart",
            Self::SuiteEnd(_) => "suiteEnd",
            Self::TestStart(_) => "testStart",
            Self::TestEnd(_) => "testEnd",
            Self::Error(_) => "error",
        }
    }
}

/// Receives lifecycle notifications.
///
/// `emit` is called synchronously with the tree mutation it reports.
pub trait Host {
    /// Broadcast one notification.
    fn emit(&self, event: HostEvent<'_>) -> Acknowledgement;
}

impl<H: Host + ?Sized> Host for &H {
    fn emit(&self, event: HostEvent<'_>) -> Acknowledgement {
        (**self).emit(event)
    }
}
