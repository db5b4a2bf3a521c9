use std::collections::BTreeSet;

use crate::model::grow::{Grow, PlantId};
use crate::model::stage::{AggregateStage, CanonicalStage, StageVocabulary};
use crate::ops::relevance::resolve_relevant_plants;

/// Aggregate stage of the in-scope plants with the built-in vocabulary.
pub fn aggregate(grow: Option<&Grow>, selected: &[PlantId]) -> Option<AggregateStage> {
    aggregate_with(StageVocabulary::builtin(), grow, selected)
}

/// Reduce the stages of the in-scope plants to one value.
///
/// Plants without a recognizable stage carry no signal. When none of them
/// does, the grow's own stage is used. Returns `None` when nothing carries
/// a stage, `Mixed` when more than one distinct stage is present.
pub fn aggregate_with(
    vocab: &StageVocabulary,
    grow: Option<&Grow>,
    selected: &[PlantId],
) -> Option<AggregateStage> {
    let mut stages: BTreeSet<CanonicalStage> = resolve_relevant_plants(grow, selected)
        .into_iter()
        .filter_map(|p| vocab.normalize(p.stage.as_deref()))
        .collect();

    if stages.is_empty()
        && let Some(fallback) = grow.and_then(|g| vocab.normalize(g.stage.as_deref()))
    {
        stages.insert(fallback);
    }

    let mut iter = stages.into_iter();
    let first = iter.next()?;
    if iter.next().is_some() {
        Some(AggregateStage::Mixed)
    } else {
        Some(AggregateStage::Stage(first))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::grow::Plant;

    fn grow_with(stages: &[Option<&str>]) -> Grow {
        let mut g = Grow::new("g1");
        g.plants = stages
            .iter()
            .enumerate()
            .map(|(i, s)| Plant::new(&format!("p{}", i + 1), *s))
            .collect();
        g
    }

    #[test]
    fn test_unanimous_after_normalization() {
        let g = grow_with(&[Some("veg"), Some("vegetative"), Some("Vegetative")]);
        assert_eq!(
            aggregate(Some(&g), &[]),
            Some(AggregateStage::Stage(CanonicalStage::Vegetative))
        );
    }

    #[test]
    fn test_mixed() {
        let g = grow_with(&[Some("veg"), Some("flower"), Some("veg")]);
        assert_eq!(aggregate(Some(&g), &[]), Some(AggregateStage::Mixed));
    }

    #[test]
    fn test_selection_narrows_scope() {
        let g = grow_with(&[Some("veg"), Some("flower"), Some("veg")]);
        let selected = vec!["p1".to_string(), "p3".to_string()];
        assert_eq!(
            aggregate(Some(&g), &selected),
            Some(AggregateStage::Stage(CanonicalStage::Vegetative))
        );
    }

    #[test]
    fn test_unknown_stages_carry_no_signal() {
        let g = grow_with(&[Some("flowering"), Some("harvest"), None]);
        assert_eq!(
            aggregate(Some(&g), &[]),
            Some(AggregateStage::Stage(CanonicalStage::Flower))
        );
    }

    #[test]
    fn test_falls_back_to_grow_stage() {
        let mut g = grow_with(&[None, Some("???")]);
        g.stage = Some("drying".into());
        assert_eq!(
            aggregate(Some(&g), &[]),
            Some(AggregateStage::Stage(CanonicalStage::Drying))
        );
    }

    #[test]
    fn test_grow_stage_ignored_when_plants_have_signal() {
        let mut g = grow_with(&[Some("veg")]);
        g.stage = Some("flower".into());
        assert_eq!(
            aggregate(Some(&g), &[]),
            Some(AggregateStage::Stage(CanonicalStage::Vegetative))
        );
    }

    #[test]
    fn test_empty_grow_uses_grow_stage() {
        let mut g = Grow::new("g1");
        g.stage = Some("Seedling".into());
        assert_eq!(
            aggregate(Some(&g), &[]),
            Some(AggregateStage::Stage(CanonicalStage::Seedling))
        );
    }

    #[test]
    fn test_no_signal_anywhere() {
        let g = grow_with(&[None, None]);
        assert_eq!(aggregate(Some(&g), &[]), None);
        assert_eq!(aggregate(None, &[]), None);
    }

    #[test]
    fn test_selection_matching_nothing_falls_back() {
        let mut g = grow_with(&[Some("veg")]);
        g.stage = Some("curing".into());
        let selected = vec!["missing".to_string()];
        assert_eq!(
            aggregate(Some(&g), &selected),
            Some(AggregateStage::Stage(CanonicalStage::Curing))
        );
    }

    #[test]
    fn test_deterministic() {
        let g = grow_with(&[Some("veg"), Some("flower")]);
        let selected = vec!["p2".to_string()];
        assert_eq!(aggregate(Some(&g), &selected), aggregate(Some(&g), &selected));
    }

    #[test]
    fn test_custom_vocabulary() {
        let mut aliases = indexmap::IndexMap::new();
        aliases.insert("bloom".to_string(), "Flower".to_string());
        let vocab = StageVocabulary::from_tables(&aliases, &indexmap::IndexMap::new()).unwrap();
        let g = grow_with(&[Some("bloom"), Some("flower")]);
        assert_eq!(
            aggregate_with(&vocab, Some(&g), &[]),
            Some(AggregateStage::Stage(CanonicalStage::Flower))
        );
        assert_eq!(
            aggregate(Some(&g), &[]),
            Some(AggregateStage::Stage(CanonicalStage::Flower))
        );
    }
}
