//! Collision-free artifact naming.
//!
//! Upload names combine a UTC timestamp with a random suffix. Run-scoped
//! artifacts (segments, merged output) derive from the run id, so
//! concurrent runs never collide and a run's cleanup can only ever target
//! its own files.

/// Length of the random suffix on uploaded file names.
const SUFFIX_LEN: usize = 8;

/// Generate a unique filename for a saved upload.
///
/// Shape: `{YYYYMMDD_HHMMSS}_{8 random hex chars}{extension}`.
pub fn upload_filename(extension: &str) -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let unique = uuid::Uuid::new_v4().simple().to_string();
    format!("{stamp}_{}{extension}", &unique[..SUFFIX_LEN])
}

/// Filename for the downloaded clip bridging pair `index` of a run.
pub fn segment_filename(run_id: &str, index: usize) -> String {
    format!("{run_id}_seg{index}.mp4")
}

/// Filename for a run's final merged output.
pub fn merged_filename(run_id: &str) -> String {
    format!("{run_id}_merged.mp4")
}
