//! Progress indicators and user interface utilities
//!
//! This module provides a unified progress system for Drydock's long-running
//! operations (fetching mirrors, resolving dependencies, checking out pinned
//! revisions, building) using the `MultiPhaseProgress` approach. All progress
//! tracking goes through phases to ensure a consistent user experience.
//!
//! # Configuration
//!
//! Progress indicators are controlled via the `MultiPhaseProgress` constructor
//! parameter (typically `!args.quiet && stdout_is_tty`) rather than environment
//! variables, so behavior stays predictable under test.
//!
//! # Examples
//!
//! ```rust,no_run
//! use drydock_cli::utils::progress::{MultiPhaseProgress, InstallationPhase};
//!
//! let progress = MultiPhaseProgress::new(true);
//!
//! progress.start_phase(InstallationPhase::FetchingSources, Some("Updating mirrors"));
//! // ... do work ...
//! progress.complete_phase(Some("Fetched 3 repositories"));
//!
//! progress.start_phase(InstallationPhase::ResolvingDependencies, None);
//! // ... do work ...
//! progress.complete_phase(Some("Resolved 12 dependencies"));
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// Re-export for deprecated functions - use MultiPhaseProgress instead
#[deprecated(since = "0.3.0", note = "Use MultiPhaseProgress instead")]
pub use indicatif::ProgressBar;

/// Phases of a `bootstrap`/`update` run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationPhase {
    /// Cloning or fetching mirrors for referenced repositories.
    FetchingSources,
    /// Running the backtracking resolver.
    ResolvingDependencies,
    /// Checking out resolved revisions into `Checkouts/`.
    CheckingOutDependencies,
    /// Running the build orchestrator.
    Building,
    /// Writing `Cartfile.resolved` and version files.
    Finalizing,
}

impl InstallationPhase {
    /// Get a human-readable description of the phase
    pub fn description(&self) -> &'static str {
        match self {
            Self::FetchingSources => "Fetching sources",
            Self::ResolvingDependencies => "Resolving dependencies",
            Self::CheckingOutDependencies => "Checking out dependencies",
            Self::Building => "Building",
            Self::Finalizing => "Finalizing",
        }
    }

    /// Get the spinner prefix for this phase
    pub fn spinner_prefix(&self) -> &'static str {
        match self {
            Self::FetchingSources => "⏳",
            Self::ResolvingDependencies => "🔍",
            Self::CheckingOutDependencies => "📦",
            Self::Building => "🔨",
            Self::Finalizing => "✨",
        }
    }
}

/// Multi-phase progress manager that displays multiple progress bars
/// with completed phases showing as static messages
#[derive(Clone)]
pub struct MultiPhaseProgress {
    /// MultiProgress container from indicatif
    multi: Arc<indicatif::MultiProgress>,
    /// Current active spinner/progress bar
    current_bar: Arc<Mutex<Option<IndicatifBar>>>,
    /// Whether progress is enabled
    enabled: bool,
}

impl MultiPhaseProgress {
    /// Create a new multi-phase progress manager
    pub fn new(enabled: bool) -> Self {
        Self {
            multi: Arc::new(indicatif::MultiProgress::new()),
            current_bar: Arc::new(Mutex::new(None)),
            enabled,
        }
    }

    /// Start a new phase with a spinner
    pub fn start_phase(&self, phase: InstallationPhase, message: Option<&str>) {
        if !self.enabled {
            let phase_msg = if let Some(msg) = message {
                format!("{} {} {}", phase.spinner_prefix(), phase.description(), msg)
            } else {
                format!("{} {}", phase.spinner_prefix(), phase.description())
            };
            println!("{}", phase_msg);
            return;
        }

        if let Ok(mut guard) = self.current_bar.lock() {
            *guard = None;
        }

        let spinner = self.multi.add(IndicatifBar::new_spinner());

        let phase_msg = format!(
            "{} {} {}",
            phase.spinner_prefix(),
            phase.description(),
            message.unwrap_or("")
        );

        let style = IndicatifStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner} {msg}")
            .unwrap();

        spinner.set_style(style);
        spinner.set_message(phase_msg);
        spinner.enable_steady_tick(Duration::from_millis(100));

        *self.current_bar.lock().unwrap() = Some(spinner);
    }

    /// Start a new phase with a progress bar
    pub fn start_phase_with_progress(&self, phase: InstallationPhase, total: usize) {
        if !self.enabled {
            println!(
                "{} {} (0/{})",
                phase.spinner_prefix(),
                phase.description(),
                total
            );
            return;
        }

        if let Ok(mut guard) = self.current_bar.lock() {
            *guard = None;
        }

        let progress_bar = self.multi.add(IndicatifBar::new(total as u64));

        let style = IndicatifStyle::default_bar()
            .template(&format!(
                "{} {{msg}} [{{bar:40.cyan/blue}}] {{pos}}/{{len}}",
                phase.spinner_prefix()
            ))
            .unwrap()
            .progress_chars("=>-");

        progress_bar.set_style(style);
        progress_bar.set_message(phase.description());

        *self.current_bar.lock().unwrap() = Some(progress_bar);
    }

    /// Update the message of the current phase
    pub fn update_message(&self, message: String) {
        if let Ok(guard) = self.current_bar.lock()
            && let Some(ref bar) = *guard
        {
            bar.set_message(message);
        }
    }

    /// Update the current message for the active phase
    pub fn update_current_message(&self, message: &str) {
        if let Ok(guard) = self.current_bar.lock()
            && let Some(ref bar) = *guard
        {
            bar.set_message(message.to_string());
        }
    }

    /// Increment progress for progress bars
    pub fn increment_progress(&self, delta: u64) {
        if let Ok(guard) = self.current_bar.lock()
            && let Some(ref bar) = *guard
        {
            bar.inc(delta);
        }
    }

    /// Set progress position for progress bars
    pub fn set_progress(&self, pos: usize) {
        if let Ok(guard) = self.current_bar.lock()
            && let Some(ref bar) = *guard
        {
            bar.set_position(pos as u64);
        }
    }

    /// Complete the current phase and show it as a static message
    pub fn complete_phase(&self, message: Option<&str>) {
        if !self.enabled {
            if let Some(msg) = message {
                println!("✓ {}", msg);
            }
            return;
        }

        if let Ok(mut guard) = self.current_bar.lock()
            && let Some(bar) = guard.take()
        {
            bar.disable_steady_tick();

            let final_message = if let Some(msg) = message {
                format!("✓ {}", msg)
            } else {
                "✓ Phase complete".to_string()
            };

            bar.finish_and_clear();

            self.multi.suspend(|| {
                println!("{}", final_message);
            });
        }
    }

    /// Clear all progress displays
    pub fn clear(&self) {
        if let Ok(mut guard) = self.current_bar.lock()
            && let Some(bar) = guard.take()
        {
            bar.finish_and_clear();
        }
        self.multi.clear().ok();
    }

    /// Create a subordinate progress bar for detailed progress within a phase
    pub fn add_progress_bar(&self, total: u64) -> Option<IndicatifBar> {
        if !self.enabled {
            return None;
        }

        let pb = self.multi.add(IndicatifBar::new(total));
        let style = IndicatifStyle::default_bar()
            .template("  {msg} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap()
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installation_phase_description() {
        assert_eq!(InstallationPhase::FetchingSources.description(), "Fetching sources");
        assert_eq!(
            InstallationPhase::ResolvingDependencies.description(),
            "Resolving dependencies"
        );
        assert_eq!(
            InstallationPhase::CheckingOutDependencies.description(),
            "Checking out dependencies"
        );
        assert_eq!(InstallationPhase::Building.description(), "Building");
        assert_eq!(InstallationPhase::Finalizing.description(), "Finalizing");
    }

    #[test]
    fn test_installation_phase_spinner_prefix() {
        assert_eq!(InstallationPhase::FetchingSources.spinner_prefix(), "⏳");
        assert_eq!(InstallationPhase::ResolvingDependencies.spinner_prefix(), "🔍");
        assert_eq!(InstallationPhase::CheckingOutDependencies.spinner_prefix(), "📦");
        assert_eq!(InstallationPhase::Building.spinner_prefix(), "🔨");
        assert_eq!(InstallationPhase::Finalizing.spinner_prefix(), "✨");
    }

    #[test]
    fn test_multi_phase_progress_new() {
        let progress = MultiPhaseProgress::new(true);

        progress.start_phase(InstallationPhase::FetchingSources, Some("test message"));
        progress.update_current_message("updated message");
        progress.complete_phase(Some("completed"));
        progress.clear();
    }

    #[test]
    fn test_multi_phase_progress_with_progress_bar() {
        let progress = MultiPhaseProgress::new(true);

        progress.start_phase_with_progress(InstallationPhase::CheckingOutDependencies, 10);
        progress.increment_progress(5);
        progress.set_progress(8);
        progress.complete_phase(Some("Checkout completed"));
    }

    #[test]
    fn test_multi_phase_progress_disabled() {
        let progress = MultiPhaseProgress::new(false);

        progress.start_phase(InstallationPhase::FetchingSources, None);
        progress.complete_phase(Some("test"));
        progress.clear();
    }
}
