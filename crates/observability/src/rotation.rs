//! Rotation plan - pure backup-index arithmetic
//!
//! Deciding *what* to rename is kept apart from the file system so the
//! backup-set invariants can be checked without touching disk.

/// One file operation of a rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStep {
    /// Delete backup `n`
    RemoveBackup(u32),
    /// Rename backup `from` to backup `to`
    ShiftBackup { from: u32, to: u32 },
    /// Rename the active file to backup 0
    ActiveToBackup,
    /// Delete the active file (no backups kept)
    RemoveActive,
}

/// Ordered steps that rotate a log with `existing` contiguous backups
/// (`path-0 .. path-(existing-1)`) while keeping at most `max_backups`.
///
/// The oldest backup is evicted first when the set is full, then every
/// backup shifts up by one, then the active file becomes backup 0.
pub fn plan(existing: u32, max_backups: u32) -> Vec<RotationStep> {
    if max_backups == 0 {
        return vec![RotationStep::RemoveActive];
    }

    let mut steps = Vec::with_capacity(existing as usize + 2);
    let mut kept = existing.min(max_backups);

    if kept == max_backups {
        steps.push(RotationStep::RemoveBackup(max_backups - 1));
        kept -= 1;
    }

    for k in (0..kept).rev() {
        steps.push(RotationStep::ShiftBackup { from: k, to: k + 1 });
    }

    steps.push(RotationStep::ActiveToBackup);
    steps
}

/// Backup count after applying [`plan`]
pub fn backups_after(existing: u32, max_backups: u32) -> u32 {
    if max_backups == 0 {
        0
    } else {
        (existing + 1).min(max_backups)
    }
}
