use std::collections::BTreeSet;

use framework::exception::CoreRsResult;
use framework::validation_error;

use super::error_code;

const VOLUME_MARKER: &str = "Vol.";

/// One archive run's slot within its month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveVolume {
    pub base_label: String,
    pub number: u32,
}

impl ArchiveVolume {
    /// Volume 1 is the bare base label, later volumes get a " Vol. N" suffix.
    pub fn label(&self) -> String {
        if self.number == 1 {
            self.base_label.clone()
        } else {
            format!("{} {VOLUME_MARKER} {}", self.base_label, self.number)
        }
    }
}

/// Picks the lowest volume in `1..=max_volume` not already used by an existing thread title.
pub fn resolve_volume(base_label: &str, existing_titles: &[String], max_volume: u32) -> CoreRsResult<ArchiveVolume> {
    let used: BTreeSet<u32> = existing_titles
        .iter()
        .filter_map(|title| volume_number(base_label, title))
        .collect();

    (1..=max_volume)
        .find(|number| !used.contains(number))
        .map(|number| ArchiveVolume {
            base_label: base_label.to_owned(),
            number,
        })
        .ok_or_else(|| {
            validation_error!(
                code = error_code::VOLUME_CAP_REACHED,
                message = format!(
                    "❌ {base_label} already has Vol. 1–{max_volume}. Delete an old version to generate again."
                )
            )
        })
}

/// Volume a title occupies under `base_label`, None for unrelated or malformed titles.
fn volume_number(base_label: &str, title: &str) -> Option<u32> {
    let suffix = title.strip_prefix(base_label)?.trim();
    if suffix.is_empty() {
        return Some(1);
    }
    let number = suffix.strip_prefix(VOLUME_MARKER)?.trim();
    if !number.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    number.parse().ok().filter(|number| *number > 0)
}
