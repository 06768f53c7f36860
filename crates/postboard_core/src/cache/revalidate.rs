//! Page-regeneration signal fired after successful writes.

use log::info;
use std::sync::{Arc, Mutex};

/// Path of the root listing page.
pub const ROOT_PATH: &str = "/";

/// Marks rendered output for a path as needing a rebuild on next request.
pub trait PageRevalidator {
    fn revalidate_path(&self, path: &str);
}

impl<P: PageRevalidator + ?Sized> PageRevalidator for Arc<P> {
    fn revalidate_path(&self, path: &str) {
        (**self).revalidate_path(path)
    }
}

/// Revalidator for deployments without a rendering layer; only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRevalidator;

impl PageRevalidator for NoopRevalidator {
    fn revalidate_path(&self, path: &str) {
        info!("event=page_revalidate module=cache status=skipped path={path}");
    }
}

/// Revalidator that remembers every signalled path, in order.
#[derive(Debug, Default)]
pub struct RecordingRevalidator {
    paths: Mutex<Vec<String>>,
}

impl RecordingRevalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths signalled so far.
    pub fn paths(&self) -> Vec<String> {
        match self.paths.lock() {
            Ok(paths) => paths.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl PageRevalidator for RecordingRevalidator {
    fn revalidate_path(&self, path: &str) {
        let mut paths = match self.paths.lock() {
            Ok(paths) => paths,
            Err(poisoned) => poisoned.into_inner(),
        };
        paths.push(path.to_string());
        info!("event=page_revalidate module=cache status=ok path={path}");
    }
}

#[cfg(test)]
mod tests {
    use super::{PageRevalidator, RecordingRevalidator, ROOT_PATH};

    #[test]
    fn records_paths_in_signal_order() {
        let pages = RecordingRevalidator::new();
        pages.revalidate_path(ROOT_PATH);
        pages.revalidate_path("/users");
        assert_eq!(pages.paths(), vec!["/".to_string(), "/users".to_string()]);
    }
}
