//! Offline job that harvests the student/course tables from the directory site.
//!
//! 1. Fetch the alias index page and collect this semester's course page links
//! 2. Fetch course pages in concurrent batches
//! 3. Parse each page for student identifiers (and names where listed)
//! 4. Build both lookup tables and write them as JSON
//!
//! A course page that cannot be fetched is logged and skipped; only failure
//! to fetch the index page aborts the run.

mod error;
pub mod parse;

pub use error::ScrapeError;

use crate::config::ScrapeConfig;
use crate::directory::{StudentDirectory, StudentRef};
use futures::future::join_all;
use parse::CoursePage;
use rand::Rng;
use reqwest::Client;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

/// Client for the course directory site.
pub struct DirectoryScraper {
    client: Client,
    base_url: Url,
    config: ScrapeConfig,
}

impl DirectoryScraper {
    pub fn new(config: ScrapeConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            // The directory site serves a self-signed certificate
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScrapeError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        // Url::join drops the last path segment unless it ends with '/'
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
            config,
        })
    }

    /// Runs the full scrape and returns the assembled directory.
    pub async fn run(&self) -> Result<StudentDirectory, ScrapeError> {
        let run_id = generate_run_id();
        let start = Instant::now();
        let index_url = self.base_url.join(&self.config.index_page)?;

        info!(
            run_id = %run_id,
            url = %index_url,
            prefix = %self.config.semester_prefix,
            "Fetching course index"
        );
        let index_html = self.fetch_text(&index_url).await?;

        let links = parse::extract_course_links(&index_html, &self.config.semester_prefix);
        if links.is_empty() {
            return Err(ScrapeError::NoCoursePages {
                prefix: self.config.semester_prefix.clone(),
            });
        }
        info!(run_id = %run_id, "Found {} course pages", links.len());

        let mut builder = DirectoryBuilder::default();
        let batch_size = self.config.batch_size.max(1);

        for (n, batch) in links.chunks(batch_size).enumerate() {
            let first = n * batch_size + 1;
            info!(
                run_id = %run_id,
                "Processing batch {}-{}",
                first,
                first + batch.len() - 1
            );

            let pages = join_all(batch.iter().map(|link| self.fetch_course_page(link, &run_id))).await;
            for page in pages.into_iter().flatten() {
                builder.add_page(page);
            }
        }

        let directory = builder.finish();
        info!(
            run_id = %run_id,
            students = directory.student_count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Scrape completed"
        );
        Ok(directory)
    }

    /// Fetches and parses one course page; failures are logged and yield `None`.
    async fn fetch_course_page(&self, link: &str, run_id: &str) -> Option<CoursePage> {
        let course_code = parse::course_code_from_link(link)?;

        let result = match self.base_url.join(link) {
            Ok(url) => self.fetch_text(&url).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(html) => Some(parse::parse_course_page(&course_code, &html)),
            Err(e) => {
                warn!(
                    run_id = %run_id,
                    link = %link,
                    error = %e,
                    "Skipping course page"
                );
                None
            }
        }
    }

    async fn fetch_text(&self, url: &Url) -> Result<String, ScrapeError> {
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Accumulates parsed pages into the two lookup tables.
#[derive(Debug, Default)]
pub struct DirectoryBuilder {
    student_courses: HashMap<String, Vec<String>>,
    course_students: HashMap<String, Vec<StudentRef>>,
}

impl DirectoryBuilder {
    pub fn add_page(&mut self, page: CoursePage) {
        let roster = self
            .course_students
            .entry(page.course_code.clone())
            .or_default();

        for student in page.students {
            let courses = self.student_courses.entry(student.id.clone()).or_default();
            if !courses.contains(&page.course_code) {
                courses.push(page.course_code.clone());
            }
            match roster.iter_mut().find(|s| s.id == student.id) {
                Some(existing) if existing.name.is_empty() => existing.name = student.name,
                Some(_) => {}
                None => roster.push(student),
            }
        }
    }

    pub fn finish(self) -> StudentDirectory {
        StudentDirectory::new(self.student_courses, self.course_students)
    }
}

/// Writes both tables as pretty-printed JSON with sorted keys.
pub fn write_tables(
    directory: &StudentDirectory,
    student_courses_path: &Path,
    course_students_path: &Path,
) -> Result<(), ScrapeError> {
    let (forward, reverse) = directory.to_tables();
    write_json(student_courses_path, &forward)?;
    write_json(course_students_path, &reverse)?;
    info!(
        "Saved courses for {} students to {}",
        forward.len(),
        student_courses_path.display()
    );
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ScrapeError> {
    let output_err = |message: String| ScrapeError::Output {
        path: path.display().to_string(),
        message,
    };
    let json = serde_json::to_string_pretty(value).map_err(|e| output_err(e.to_string()))?;
    fs::write(path, json).map_err(|e| output_err(e.to_string()))
}

/// Generates a short id for correlating the log lines of one run.
fn generate_run_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, name: &str) -> StudentRef {
        StudentRef {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_builder_merges_pages() {
        let mut builder = DirectoryBuilder::default();
        builder.add_page(CoursePage {
            course_code: "COL106".to_string(),
            students: vec![student("cs1230456", ""), student("ee1230001", "Vikram Sen")],
        });
        builder.add_page(CoursePage {
            course_code: "MTL100".to_string(),
            students: vec![student("cs1230456", "Asha Rao")],
        });
        builder.add_page(CoursePage {
            course_code: "COL106".to_string(),
            students: vec![student("cs1230456", "Asha Rao")],
        });

        let directory = builder.finish();
        assert_eq!(
            directory.lookup_student_courses("cs1230456").unwrap(),
            ["COL106", "MTL100"]
        );
        let roster = directory.students_in_course("COL106");
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].name, "Asha Rao");
    }

    #[test]
    fn test_write_tables() {
        let mut builder = DirectoryBuilder::default();
        builder.add_page(CoursePage {
            course_code: "COL106".to_string(),
            students: vec![student("cs1230456", "Asha Rao")],
        });
        let directory = builder.finish();

        let dir = tempfile::tempdir().unwrap();
        let forward = dir.path().join("studentCourses.json");
        let reverse = dir.path().join("courseStudents.json");
        write_tables(&directory, &forward, &reverse).unwrap();

        let loaded = StudentDirectory::load(&forward, &reverse).unwrap();
        assert_eq!(loaded, directory);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let scraper = DirectoryScraper::new(ScrapeConfig {
            base_url: "https://example.org/LDAP/courses".to_string(),
            ..ScrapeConfig::default()
        })
        .unwrap();
        assert_eq!(
            scraper.base_url.join("2502-COL106.shtml").unwrap().as_str(),
            "https://example.org/LDAP/courses/2502-COL106.shtml"
        );
    }
}
