use crate::api::models::{DuplicateKind, DuplicateTrack, MergeResult};
use crate::merge::decoder::MergeProgress;

impl MergeProgress {
    /// One-line status text, e.g. `Fetching tracks (50%)`. `None` when the
    /// record carried neither a message nor a percentage.
    pub fn status_line(&self) -> Option<String> {
        match (&self.message, self.progress) {
            (Some(message), Some(progress)) => {
                Some(format!("{} ({}%)", message, progress.round() as i64))
            }
            (None, Some(progress)) => Some(format!("Working ({}%)", progress.round() as i64)),
            (Some(message), None) => Some(message.clone()),
            (None, None) => None,
        }
    }

    /// Percentage clamped into 0..=100 for progress bars.
    pub fn percent(&self) -> Option<u64> {
        self.progress.map(|p| p.clamp(0.0, 100.0).round() as u64)
    }
}

impl MergeResult {
    pub fn summary(&self, deep_clean: bool, track_limit: u32) -> String {
        let mut message = format!("Done! Created playlist with {} tracks.", self.track_count);

        if self.duplicates_removed > 0 {
            if deep_clean && self.intra_playlist_duplicates > 0 {
                message.push_str(&format!(
                    " ({} duplicates removed, including {} within playlists)",
                    self.duplicates_removed, self.intra_playlist_duplicates
                ));
            } else {
                message.push_str(&format!(" ({} duplicates removed)", self.duplicates_removed));
            }
        }

        if self.was_truncated {
            message.push_str(&format!(
                " Note: Tidal limits playlists to {} tracks - {} additional tracks were not added.",
                group_thousands(track_limit as u64),
                group_thousands(self.truncated_count as u64)
            ));
        }

        message
    }

    /// Up to `limit` sampled duplicates, one line each, followed by a
    /// "Showing N of M" line whenever some were left out. Empty when the
    /// server sent no sample.
    pub fn duplicate_lines(&self, limit: usize) -> Vec<String> {
        let mut lines: Vec<String> = self
            .duplicates
            .iter()
            .take(limit)
            .map(DuplicateTrack::display_line)
            .collect();

        let total = (self.total_duplicate_tracks as usize).max(self.duplicates.len());
        if !lines.is_empty() && lines.len() < total {
            lines.push(format!("Showing {} of {} duplicates", lines.len(), total));
        }
        lines
    }
}

impl DuplicateTrack {
    pub fn display_line(&self) -> String {
        let marker = match self.kind {
            Some(DuplicateKind::Intra) => "within",
            _ => "across",
        };
        format!(
            "[{}] {} - {} (in {})",
            marker,
            self.name,
            self.artist,
            self.appeared_in.join(", ")
        )
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
