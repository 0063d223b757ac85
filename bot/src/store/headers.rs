use std::path::PathBuf;

use tracing::info;

use super::json_file::{self, StoreError};
use super::models::CourseHeaders;

/// Repository for the course header document.
#[derive(Debug)]
pub struct HeaderStore {
    path: PathBuf,
    headers: CourseHeaders,
}

impl HeaderStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let headers: CourseHeaders = json_file::load(&path)?;
        info!(path = %path.display(), courses = headers.len(), "loaded course headers");
        Ok(Self { path, headers })
    }

    pub fn save(&self) -> Result<(), StoreError> {
        json_file::save(&self.path, &self.headers)
    }

    pub fn get(&self, course: &str) -> Option<&str> {
        self.headers.get(course).map(String::as_str)
    }

    /// Insert or replace the header for a course.
    pub fn set(&mut self, course: String, header: String) {
        self.headers.insert(course, header);
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}
