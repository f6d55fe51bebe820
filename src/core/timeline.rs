//! Target version chains as explicit interval lists.
//!
//! Each category's targets form a chain of half-open month intervals
//! `[from, to)`, the last of which may be open (`to = None`). Editing the chain
//! at month `M` never touches the part of the history before `M`: the version
//! covering `M` is either removed (it starts at `M`) or closed at `M`.
//!
//! [`plan_edit`] is the single decision used both by the database operations in
//! [`crate::core::target`] and by the in-memory [`TargetTimeline`], which exists
//! so the chain invariants can be checked directly.

use crate::{
    core::{funding::TargetSpec, month::Month},
    entities::category_target,
    errors::{Error, Result},
};

/// What happens to the version covering the edited month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEdit {
    /// The version starts in the edited month; drop it entirely.
    Remove,
    /// The version started earlier; end it at `at`.
    Close { at: Month },
}

/// Decides how to retire the version starting at `effective_from` when the
/// chain is edited at `month`.
#[must_use]
pub fn plan_edit(effective_from: Month, month: Month) -> ChainEdit {
    if effective_from == month {
        ChainEdit::Remove
    } else {
        ChainEdit::Close { at: month }
    }
}

/// One interval of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetVersion {
    pub from: Month,
    pub to: Option<Month>,
    pub spec: TargetSpec,
}

impl TargetVersion {
    /// Whether this version is active in `month`.
    #[must_use]
    pub fn covers(&self, month: Month) -> bool {
        self.from <= month && self.to.is_none_or(|to| month < to)
    }

    /// Reads a stored chain version.
    pub fn from_model(model: &category_target::Model) -> Result<Self> {
        Ok(Self {
            from: model.effective_from_month()?,
            to: model.effective_to_month()?,
            spec: TargetSpec::from_model(model)?,
        })
    }
}

/// A single category's target history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetTimeline {
    versions: Vec<TargetVersion>,
}

impl TargetTimeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a timeline from stored rows and checks it.
    pub fn from_models(models: &[category_target::Model]) -> Result<Self> {
        let mut versions = models
            .iter()
            .map(TargetVersion::from_model)
            .collect::<Result<Vec<_>>>()?;
        versions.sort_by_key(|version| version.from);

        let timeline = Self { versions };
        timeline.validate()?;
        Ok(timeline)
    }

    /// Versions ordered by `from`.
    #[must_use]
    pub fn versions(&self) -> &[TargetVersion] {
        &self.versions
    }

    /// The version active in `month`, if any.
    #[must_use]
    pub fn active_at(&self, month: Month) -> Option<&TargetVersion> {
        self.versions.iter().find(|version| version.covers(month))
    }

    /// Start of the first version beginning after `month`.
    #[must_use]
    pub fn next_start_after(&self, month: Month) -> Option<Month> {
        self.versions
            .iter()
            .map(|version| version.from)
            .find(|from| *from > month)
    }

    /// Makes `spec` the target from `month` on.
    ///
    /// The new version runs until the next later version starts, or stays open
    /// when there is none. Returns the edit applied to the version that used to
    /// cover `month`.
    pub fn set(&mut self, month: Month, spec: TargetSpec) -> Option<ChainEdit> {
        let edit = self.retire_active(month);
        let to = self.next_start_after(month);

        let position = self
            .versions
            .iter()
            .position(|version| version.from > month)
            .unwrap_or(self.versions.len());
        self.versions.insert(
            position,
            TargetVersion {
                from: month,
                to,
                spec,
            },
        );
        edit
    }

    /// Ends the target active in `month`. `None` when nothing is active.
    pub fn remove(&mut self, month: Month) -> Option<ChainEdit> {
        self.retire_active(month)
    }

    fn retire_active(&mut self, month: Month) -> Option<ChainEdit> {
        let index = self.versions.iter().position(|version| version.covers(month))?;
        let edit = plan_edit(self.versions[index].from, month);
        match edit {
            ChainEdit::Remove => {
                self.versions.remove(index);
            }
            ChainEdit::Close { at } => self.versions[index].to = Some(at),
        }
        Some(edit)
    }

    /// Checks the chain invariants: versions are sorted, every interval is
    /// non-empty, only the last version may be open, and no two overlap.
    pub fn validate(&self) -> Result<()> {
        for version in &self.versions {
            if version.to.is_some_and(|to| to <= version.from) {
                return Err(Error::Validation {
                    message: format!("empty target interval starting {}", version.from),
                });
            }
        }

        for pair in self.versions.windows(2) {
            let (earlier, later) = (&pair[0], &pair[1]);
            if earlier.from >= later.from {
                return Err(Error::Validation {
                    message: format!(
                        "target versions out of order at {} and {}",
                        earlier.from, later.from
                    ),
                });
            }
            match earlier.to {
                None => {
                    return Err(Error::Validation {
                        message: format!("open target version at {} is not last", earlier.from),
                    });
                }
                Some(to) if to > later.from => {
                    return Err(Error::Validation {
                        message: format!(
                            "target versions overlap: [{}, {}) and {}",
                            earlier.from, to, later.from
                        ),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::TargetType;
    use proptest::prelude::*;

    fn month(value: &str) -> Month {
        Month::parse(value).unwrap()
    }

    fn monthly(amount: i64) -> TargetSpec {
        TargetSpec::new(TargetType::MonthlySavings, amount, None).unwrap()
    }

    #[test]
    fn test_plan_edit() {
        assert_eq!(plan_edit(month("2024-01"), month("2024-01")), ChainEdit::Remove);
        assert_eq!(
            plan_edit(month("2024-01"), month("2024-03")),
            ChainEdit::Close { at: month("2024-03") }
        );
    }

    #[test]
    fn test_replace_in_later_month_closes_previous() {
        let mut timeline = TargetTimeline::new();
        assert_eq!(timeline.set(month("2024-01"), monthly(100)), None);
        assert_eq!(
            timeline.set(month("2024-03"), monthly(200)),
            Some(ChainEdit::Close { at: month("2024-03") })
        );

        let versions = timeline.versions();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].to, Some(month("2024-03")));
        assert_eq!(versions[1].to, None);
        assert_eq!(timeline.active_at(month("2024-02")).unwrap().spec, monthly(100));
        assert_eq!(timeline.active_at(month("2024-03")).unwrap().spec, monthly(200));
        assert!(timeline.active_at(month("2023-12")).is_none());
        timeline.validate().unwrap();
    }

    #[test]
    fn test_replace_in_same_month_leaves_one_version() {
        let mut timeline = TargetTimeline::new();
        timeline.set(month("2024-01"), monthly(100));
        assert_eq!(timeline.set(month("2024-01"), monthly(200)), Some(ChainEdit::Remove));

        assert_eq!(timeline.versions().len(), 1);
        assert_eq!(timeline.versions()[0].spec, monthly(200));
    }

    #[test]
    fn test_set_in_the_past_stops_at_next_version() {
        let mut timeline = TargetTimeline::new();
        timeline.set(month("2024-01"), monthly(100));
        timeline.set(month("2024-05"), monthly(500));
        timeline.set(month("2024-03"), monthly(300));

        timeline.validate().unwrap();
        let versions = timeline.versions();
        assert_eq!(versions.len(), 3);
        assert_eq!(versions[1].from, month("2024-03"));
        assert_eq!(versions[1].to, Some(month("2024-05")));
        assert_eq!(timeline.active_at(month("2024-06")).unwrap().spec, monthly(500));
    }

    #[test]
    fn test_remove_closes_or_deletes() {
        let mut timeline = TargetTimeline::new();
        timeline.set(month("2024-01"), monthly(100));

        assert_eq!(
            timeline.remove(month("2024-04")),
            Some(ChainEdit::Close { at: month("2024-04") })
        );
        assert!(timeline.active_at(month("2024-03")).is_some());
        assert!(timeline.active_at(month("2024-04")).is_none());
        assert_eq!(timeline.remove(month("2024-04")), None);

        assert_eq!(timeline.remove(month("2024-01")), Some(ChainEdit::Remove));
        assert!(timeline.versions().is_empty());
    }

    #[test]
    fn test_validate_rejects_overlap_and_open_middle() {
        let overlapping = TargetTimeline {
            versions: vec![
                TargetVersion {
                    from: month("2024-01"),
                    to: Some(month("2024-04")),
                    spec: monthly(1),
                },
                TargetVersion {
                    from: month("2024-03"),
                    to: None,
                    spec: monthly(2),
                },
            ],
        };
        assert!(matches!(overlapping.validate(), Err(Error::Validation { .. })));

        let open_middle = TargetTimeline {
            versions: vec![
                TargetVersion {
                    from: month("2024-01"),
                    to: None,
                    spec: monthly(1),
                },
                TargetVersion {
                    from: month("2024-03"),
                    to: None,
                    spec: monthly(2),
                },
            ],
        };
        assert!(matches!(open_middle.validate(), Err(Error::Validation { .. })));

        let empty = TargetTimeline {
            versions: vec![TargetVersion {
                from: month("2024-03"),
                to: Some(month("2024-03")),
                spec: monthly(1),
            }],
        };
        assert!(matches!(empty.validate(), Err(Error::Validation { .. })));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(u32, i64),
        Remove(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..24, 1i64..1_000).prop_map(|(offset, amount)| Op::Set(offset, amount)),
            (0u32..24).prop_map(Op::Remove),
        ]
    }

    fn offset_month(offset: u32) -> Month {
        let base = month("2024-01");
        (0..offset).fold(base, |m, _| m.next())
    }

    fn snapshot(timeline: &TargetTimeline) -> Vec<Option<TargetSpec>> {
        (0..30)
            .map(|offset| timeline.active_at(offset_month(offset)).map(|v| v.spec))
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_chain_stays_valid_and_history_is_immutable(ops in proptest::collection::vec(op(), 1..40)) {
            let mut timeline = TargetTimeline::new();

            for op in ops {
                let before = snapshot(&timeline);
                match op {
                    Op::Set(offset, amount) => {
                        let edited = offset_month(offset);
                        timeline.set(edited, monthly(amount));
                        prop_assert_eq!(timeline.active_at(edited).map(|v| v.spec), Some(monthly(amount)));

                        let after = snapshot(&timeline);
                        prop_assert_eq!(&after[..offset as usize], &before[..offset as usize]);
                    }
                    Op::Remove(offset) => {
                        let edited = offset_month(offset);
                        let had_target = timeline.active_at(edited).is_some();
                        let edit = timeline.remove(edited);
                        prop_assert_eq!(edit.is_some(), had_target);
                        prop_assert!(timeline.active_at(edited).is_none());

                        let after = snapshot(&timeline);
                        prop_assert_eq!(&after[..offset as usize], &before[..offset as usize]);
                    }
                }

                prop_assert!(timeline.validate().is_ok());
                for (index, version) in timeline.versions().iter().enumerate() {
                    let covering = (0..30)
                        .map(offset_month)
                        .filter(|m| version.covers(*m))
                        .count();
                    prop_assert!(covering > 0, "version {} covers no month", index);
                }
            }
        }
    }
}
