//! Detecting and resolving missions that cannot both be satisfied.

use std::collections::HashSet;

use super::{Mission, MissionCheck, Rank};
use crate::rng::Mulberry32;
use crate::sector::Suit;
use crate::state::Player;

/// A trick-count requirement in one suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuitConstraint {
    pub suit: Suit,
    pub exact: Option<u8>,
    pub min: Option<u8>,
}

impl SuitConstraint {
    /// Same suit and no trick count satisfies both.
    #[must_use]
    pub fn contradicts(&self, other: &Self) -> bool {
        if self.suit != other.suit {
            return false;
        }
        match (self.exact, other.exact, self.min, other.min) {
            (Some(a), Some(b), _, _) if a != b => true,
            (Some(exact), _, _, Some(min)) | (_, Some(exact), Some(min), _) => exact < min,
            _ => false,
        }
    }
}

/// Flattened requirements of a check, walking `ALL_OF` branches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionConstraints {
    pub suits: Vec<SuitConstraint>,
    pub ranks_required: Vec<Rank>,
    pub ranks_forbidden: Vec<Rank>,
}

impl MissionConstraints {
    #[must_use]
    pub fn collect(check: &MissionCheck) -> Self {
        let mut constraints = Self::default();
        constraints.walk(check);
        constraints
    }

    fn walk(&mut self, check: &MissionCheck) {
        match check {
            MissionCheck::ExactTricksInSuit { suit, n } => self.suits.push(SuitConstraint {
                suit: *suit,
                exact: Some(*n),
                min: None,
            }),
            MissionCheck::AtLeastTricksInSuit { suit, n }
            | MissionCheck::RoleWinsAtLeastTricksInSuit { suit, n } => {
                self.suits.push(SuitConstraint {
                    suit: *suit,
                    exact: None,
                    min: Some(*n),
                });
            }
            MissionCheck::MultiExactTricks { req } => {
                self.suits.extend(req.iter().map(|item| SuitConstraint {
                    suit: item.suit,
                    exact: Some(item.n),
                    min: None,
                }));
            }
            MissionCheck::AnyTrickWonWithRank { rank }
            | MissionCheck::TrickWonWithRank { rank }
            | MissionCheck::RoleWinsAnyTrickWithRank { rank } => self.ranks_required.push(*rank),
            MissionCheck::NoTricksWonWithRank { rank } => self.ranks_forbidden.push(*rank),
            MissionCheck::AllOf { checks } => {
                for inner in checks {
                    self.walk(inner);
                }
            }
            _ => {}
        }
    }

    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        let suit_conflict = self
            .suits
            .iter()
            .any(|a| other.suits.iter().any(|b| a.contradicts(b)));
        let rank_conflict = self
            .ranks_required
            .iter()
            .any(|rank| other.ranks_forbidden.contains(rank))
            || other
                .ranks_required
                .iter()
                .any(|rank| self.ranks_forbidden.contains(rank));
        suit_conflict || rank_conflict
    }
}

/// Whether two missions make contradictory demands.
#[must_use]
pub fn missions_conflict(a: &Mission, b: &Mission) -> bool {
    MissionConstraints::collect(&a.check).conflicts_with(&MissionConstraints::collect(&b.check))
}

/// Shared drafting context for substitutions.
pub(crate) struct Substitution<'a> {
    pub pool: &'a [Mission],
    pub difficulty_target: u8,
    pub players: &'a [Player],
}

/// Replace conflicting optionals with compatible ones, dropping an optional
/// when no substitute is found within `pool.len()` attempts. Substitutes never
/// repeat an id already drafted this round.
pub(crate) fn resolve_conflicts(
    rng: &mut Mulberry32,
    primary: Option<&Mission>,
    optionals: Vec<Mission>,
    ctx: &Substitution<'_>,
) -> Vec<Mission> {
    let mut resolved: Vec<Mission> = Vec::new();
    let mut used: HashSet<String> = primary
        .into_iter()
        .chain(optionals.iter())
        .map(|m| m.id.clone())
        .collect();

    for optional in optionals {
        let mut candidate = Some(optional);
        let mut attempts = 0_usize;
        while let Some(current) = candidate.as_ref() {
            let clashes = primary.is_some_and(|p| missions_conflict(p, current))
                || resolved.iter().any(|existing| missions_conflict(existing, current));
            if !clashes {
                break;
            }
            used.insert(current.id.clone());
            let against: Vec<&Mission> = primary.into_iter().chain(resolved.iter()).collect();
            let replacement = find_compatible(rng, &used, &against, ctx);
            attempts += 1;
            candidate = match replacement {
                Some(found) if attempts <= ctx.pool.len() => Some(found),
                _ => None,
            };
        }
        if let Some(mission) = candidate {
            used.insert(mission.id.clone());
            resolved.push(mission);
        }
    }
    resolved
}

fn find_compatible(
    rng: &mut Mulberry32,
    used: &HashSet<String>,
    against: &[&Mission],
    ctx: &Substitution<'_>,
) -> Option<Mission> {
    let mut scored: Vec<(f64, &Mission)> = ctx
        .pool
        .iter()
        .filter(|mission| !used.contains(&mission.id))
        .map(|mission| {
            let score = super::draft::difficulty_score(mission, ctx.difficulty_target, rng);
            (score, mission)
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    for (_, template) in scored {
        let instance = super::draft::bind_and_instantiate(template, ctx.players, rng);
        if !against
            .iter()
            .any(|existing| missions_conflict(existing, &instance))
        {
            return Some(instance);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::missions::{Face, MissionOutcome, MissionTier, SuitRequirement};

    fn mission(id: &str, check: MissionCheck) -> Mission {
        Mission {
            id: id.into(),
            tier: MissionTier::Optional,
            difficulty: 2,
            tags: Vec::new(),
            text: id.into(),
            check,
            reward: None,
            role_bindings: None,
            outcome: MissionOutcome::Unknown,
        }
    }

    #[test]
    fn differing_exact_counts_conflict() {
        let a = mission(
            "A",
            MissionCheck::ExactTricksInSuit {
                suit: Suit::Diamonds,
                n: 2,
            },
        );
        let b = mission(
            "B",
            MissionCheck::ExactTricksInSuit {
                suit: Suit::Diamonds,
                n: 1,
            },
        );
        let c = mission(
            "C",
            MissionCheck::ExactTricksInSuit {
                suit: Suit::Hearts,
                n: 1,
            },
        );
        assert!(missions_conflict(&a, &b));
        assert!(!missions_conflict(&a, &c));
    }

    #[test]
    fn exact_below_minimum_conflicts_either_way() {
        let exact = mission(
            "E",
            MissionCheck::ExactTricksInSuit {
                suit: Suit::Clubs,
                n: 1,
            },
        );
        let at_least = mission(
            "M",
            MissionCheck::AtLeastTricksInSuit {
                suit: Suit::Clubs,
                n: 3,
            },
        );
        let at_least_one = mission(
            "M1",
            MissionCheck::AtLeastTricksInSuit {
                suit: Suit::Clubs,
                n: 1,
            },
        );
        assert!(missions_conflict(&exact, &at_least));
        assert!(missions_conflict(&at_least, &exact));
        assert!(!missions_conflict(&exact, &at_least_one));
    }

    #[test]
    fn multi_exact_and_all_of_are_walked() {
        let sweep = mission(
            "S",
            MissionCheck::MultiExactTricks {
                req: vec![
                    SuitRequirement {
                        suit: Suit::Hearts,
                        n: 1,
                    },
                    SuitRequirement {
                        suit: Suit::Diamonds,
                        n: 1,
                    },
                ],
            },
        );
        let variety = mission(
            "V",
            MissionCheck::AllOf {
                checks: vec![MissionCheck::AtLeastTricksInSuit {
                    suit: Suit::Diamonds,
                    n: 4,
                }],
            },
        );
        assert!(missions_conflict(&sweep, &variety));
    }

    #[test]
    fn required_rank_forbidden_elsewhere_conflicts() {
        let needs_ace = mission(
            "R",
            MissionCheck::AnyTrickWonWithRank {
                rank: Rank::Face(Face::A),
            },
        );
        let no_aces = mission(
            "N",
            MissionCheck::NoTricksWonWithRank {
                rank: Rank::Face(Face::A),
            },
        );
        let no_kings = mission(
            "K",
            MissionCheck::NoTricksWonWithRank {
                rank: Rank::Face(Face::K),
            },
        );
        assert!(missions_conflict(&needs_ace, &no_aces));
        assert!(!missions_conflict(&needs_ace, &no_kings));
    }

    #[test]
    fn in_order_checks_are_not_constraints() {
        let ordered = MissionCheck::InOrder {
            checks: vec![MissionCheck::ExactTricksInSuit {
                suit: Suit::Spades,
                n: 1,
            }],
        };
        assert_eq!(
            MissionConstraints::collect(&ordered),
            MissionConstraints::default()
        );
    }

    #[test]
    fn unresolvable_optional_is_dropped() {
        let primary = mission(
            "P",
            MissionCheck::ExactTricksInSuit {
                suit: Suit::Spades,
                n: 2,
            },
        );
        let clash = mission(
            "O",
            MissionCheck::ExactTricksInSuit {
                suit: Suit::Spades,
                n: 1,
            },
        );
        let pool = vec![clash.clone()];
        let ctx = Substitution {
            pool: &pool,
            difficulty_target: 1,
            players: &[],
        };
        let mut rng = Mulberry32::new(3);
        let resolved = resolve_conflicts(&mut rng, Some(&primary), vec![clash], &ctx);
        assert!(resolved.is_empty());
    }

    #[test]
    fn conflicting_optional_is_substituted() {
        let primary = mission(
            "P",
            MissionCheck::ExactTricksInSuit {
                suit: Suit::Spades,
                n: 2,
            },
        );
        let clash = mission(
            "O1",
            MissionCheck::ExactTricksInSuit {
                suit: Suit::Spades,
                n: 1,
            },
        );
        let fine = mission(
            "O2",
            MissionCheck::WinATrickInSuit {
                suit: Suit::Hearts,
            },
        );
        let pool = vec![clash.clone(), fine];
        let ctx = Substitution {
            pool: &pool,
            difficulty_target: 1,
            players: &[],
        };
        let mut rng = Mulberry32::new(3);
        let resolved = resolve_conflicts(&mut rng, Some(&primary), vec![clash], &ctx);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, "O2");
    }
}
