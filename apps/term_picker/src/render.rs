use std::fmt;

use cascade::{LoadStatus, SelectionState};
use shared::domain::Level;

const PLACEHOLDER: &str = "Select a term";

/// Text rendering of the three selectors, the selected term and the level-three list.
pub struct Screen<'a>(pub &'a SelectionState);

impl fmt::Display for Screen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        writeln!(f, "Term Store Terms")?;

        for level in Level::ALL {
            if !state.is_available(level) {
                continue;
            }
            let slot = state.level(level);
            writeln!(f, "Level {level}:")?;
            let marker = if slot.selected().is_none() { "*" } else { " " };
            writeln!(f, "  {marker} 0. {PLACEHOLDER}")?;
            for (position, term) in slot.children().iter().enumerate() {
                let marker = if slot.selected() == Some(&term.id) { "*" } else { " " };
                writeln!(f, "  {marker} {}. {}", position + 1, term.label)?;
            }
            match slot.status() {
                LoadStatus::Idle => writeln!(f, "    (waiting)")?,
                LoadStatus::Loading => writeln!(f, "    (loading...)")?,
                LoadStatus::Failed(error) => writeln!(f, "    (load failed: {error})")?,
                LoadStatus::Loaded if slot.children().is_empty() => {
                    writeln!(f, "    (no terms)")?
                }
                LoadStatus::Loaded => {}
            }
        }

        if let Some(term) = state.selected_term(Level::Three) {
            writeln!(f)?;
            writeln!(f, "Selected Term Details")?;
            writeln!(f, "  {}", term.label)?;
        }

        let leaves = state.level(Level::Three).children();
        if !leaves.is_empty() {
            writeln!(f)?;
            for term in leaves {
                writeln!(f, "  - {}", term.label)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade::{CascadeController, FetchCompletion, Transition};
    use shared::{
        domain::{Term, TermId},
        error::FetchError,
    };

    fn id(raw: &str) -> TermId {
        TermId::new(raw).expect("id")
    }

    fn resolve(controller: &mut CascadeController, level: Level, terms: Vec<Term>) {
        let request = controller.pending(level).cloned().expect("pending");
        controller.complete(FetchCompletion {
            request,
            result: Ok(terms),
        });
    }

    #[test]
    fn hides_levels_without_parent_selection() {
        let mut controller = CascadeController::new(id("anchor"));
        controller.mount();
        resolve(
            &mut controller,
            Level::One,
            vec![Term::new(id("a"), "North"), Term::new(id("b"), "South")],
        );
        let text = Screen(controller.state()).to_string();
        assert!(text.contains("Level 1:"));
        assert!(text.contains("* 0. Select a term"));
        assert!(text.contains("  1. North"));
        assert!(!text.contains("Level 2:"));
    }

    #[test]
    fn shows_loading_failure_and_empty_states() {
        let mut controller = CascadeController::new(id("anchor"));
        let request = controller.mount();
        assert!(Screen(controller.state()).to_string().contains("(loading...)"));

        controller.complete(FetchCompletion {
            request,
            result: Err(FetchError::status(503, "Service Unavailable")),
        });
        assert!(Screen(controller.state())
            .to_string()
            .contains("(load failed: term store answered 503: Service Unavailable)"));

        let retry = controller.retry(Level::One).expect("retry");
        controller.complete(FetchCompletion {
            request: retry,
            result: Ok(Vec::new()),
        });
        assert!(Screen(controller.state()).to_string().contains("(no terms)"));
    }

    #[test]
    fn shows_selected_leaf_and_leaf_list() {
        let mut controller = CascadeController::new(id("anchor"));
        controller.mount();
        resolve(&mut controller, Level::One, vec![Term::new(id("a"), "North")]);
        controller.select(Level::One, Some(id("a")));
        resolve(&mut controller, Level::Two, vec![Term::new(id("c"), "East")]);
        controller.select(Level::Two, Some(id("c")));
        resolve(
            &mut controller,
            Level::Three,
            vec![Term::new(id("e"), "Harbour"), Term::new(id("f"), "Airport")],
        );
        assert_eq!(
            controller.select(Level::Three, Some(id("f"))),
            Transition::Applied { fetch: None }
        );

        let text = Screen(controller.state()).to_string();
        assert!(text.contains("* 2. Airport"));
        assert!(text.contains("Selected Term Details\n  Airport"));
        assert!(text.contains("  - Harbour\n  - Airport"));
    }
}
