//! Policy corpus ingestion from a directory of document files.
//!
//! Loading is resilient: unreadable or undecodable files are skipped with a
//! warning rather than aborting the whole load. A missing directory or a
//! directory yielding zero documents signals [`AssistantError::EmptyCorpus`]
//! so callers can fall back to the built-in sample policy.

use std::fs;
use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::document::PolicyDocument;
use crate::error::{AssistantError, Result};

/// File extensions accepted during ingestion.
const ALLOWED_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

/// Source identifier for the built-in sample policy.
pub const DEFAULT_POLICY_SOURCE_ID: &str = "builtin_attendance_policy";

/// The sample university attendance policy shipped with the assistant.
///
/// Used as the corpus when no policy documents are available on disk.
pub const DEFAULT_POLICY_TEXT: &str = "\
## University Attendance Policy (Sample)

### 1. General Attendance Requirements

Regular attendance is required for all courses. Students are expected to attend all classes for the courses in which they are registered.

### 2. Absence Limits

**2.1** Each course syllabus will specify the number of allowed absences (typically 3-4 for a semester-long course).

**2.2** Exceeding the allowed number of absences may result in automatic failure of the course.

### 3. Excused Absences

**3.1** Absences may be excused for the following reasons:
- Illness (with medical documentation)
- Religious observances
- University-sponsored activities
- Family emergencies
- Legal obligations

**3.2** Documentation must be provided to the instructor within one week of the absence.

### 4. Late Arrivals and Early Departures

**4.1** Arriving more than 15 minutes late or leaving more than 15 minutes early may be counted as an absence.

**4.2** Three late arrivals or early departures may be counted as one absence.

### 5. Make-up Work

**5.1** Students with excused absences are responsible for arranging to make up missed work.

**5.2** Make-up work must be completed within one week of returning to class.

### 6. Appeals

**6.1** Students may appeal attendance-related decisions to the department chair and then to the dean of the college.
";

/// The built-in sample policy as a [`PolicyDocument`].
pub fn default_policy_document() -> PolicyDocument {
    PolicyDocument::new(DEFAULT_POLICY_SOURCE_ID, DEFAULT_POLICY_TEXT)
}

/// Load every readable policy document under `dir`.
///
/// Files are visited in sorted path order so ingestion is deterministic.
/// Only extensions in the allow-list are considered. Files that cannot be
/// read or decoded are skipped with a warning.
///
/// # Errors
///
/// Returns [`AssistantError::EmptyCorpus`] if the directory does not exist
/// or no document could be loaded from it.
pub fn load_corpus(dir: impl AsRef<Path>) -> Result<Vec<PolicyDocument>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        warn!(path = %dir.display(), "corpus directory does not exist");
        return Err(AssistantError::EmptyCorpus);
    }

    let mut paths = WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        let source_id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match fs::read_to_string(&path) {
            Ok(text) if !text.trim().is_empty() => {
                documents.push(PolicyDocument::new(source_id, text));
            }
            Ok(_) => {
                warn!(path = %path.display(), "skipping empty policy file");
            }
            Err(e) => {
                let error = AssistantError::MalformedDocument {
                    path: path.display().to_string(),
                    message: e.to_string(),
                };
                warn!(error = %error, "skipping unreadable policy file");
            }
        }
    }

    if documents.is_empty() {
        warn!(path = %dir.display(), "corpus directory yielded no documents");
        return Err(AssistantError::EmptyCorpus);
    }

    info!(path = %dir.display(), document_count = documents.len(), "loaded policy corpus");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_only_allowed_extensions_in_sorted_order() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();

        fs::write(root.join("b_policy.md"), "Absence limits apply.").unwrap();
        fs::write(root.join("a_policy.txt"), "Attendance is required.").unwrap();
        fs::write(root.join("ignore.pdf"), "binary").unwrap();
        fs::write(root.join("ignore.csv"), "a,b").unwrap();

        let documents = load_corpus(root).unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].source_id, "a_policy.txt");
        assert_eq!(documents[1].source_id, "b_policy.md");
    }

    #[test]
    fn skips_undecodable_files_and_keeps_the_rest() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();

        fs::write(root.join("good.txt"), "Section 4.1 covers lateness.").unwrap();
        fs::write(root.join("bad.txt"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();

        let documents = load_corpus(root).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].source_id, "good.txt");
    }

    #[test]
    fn missing_directory_is_empty_corpus() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("nope");
        assert!(matches!(load_corpus(&missing), Err(AssistantError::EmptyCorpus)));
    }

    #[test]
    fn directory_with_no_readable_documents_is_empty_corpus() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("blank.txt"), "   \n").unwrap();
        assert!(matches!(load_corpus(temp.path()), Err(AssistantError::EmptyCorpus)));
    }

    #[test]
    fn default_policy_mentions_the_lateness_rule() {
        let document = default_policy_document();
        assert!(document.text.contains("15 minutes"));
        assert!(document.text.contains("4.1"));
    }
}
