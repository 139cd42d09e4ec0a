use crate::platform::types::FeedItem;
use strum::Display;

/// What the engine does with a relevant feed item. Derived per item, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum EngagementAction {
    UpvoteOnly,
    CommentWithInfo,
    CommentWithComparison,
    CommentWithRecommendation,
    ObserveOnly,
}

impl EngagementAction {
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            Self::CommentWithInfo | Self::CommentWithComparison | Self::CommentWithRecommendation
        )
    }
}

const ADVICE_PHRASES: &[&str] = &["recommend", "advice", "suggest", "should i"];
const COMPARISON_PHRASES: &[&str] = &["vs", "compare", "better than"];
const POSITIVE_PHRASES: &[&str] = &["insight", "learned", "interesting"];
const UPVOTE_THRESHOLD: u32 = 5;

/// Pure text classifier: relevance by configured keywords, engagement by a
/// fixed precedence ladder. No side effects, deterministic.
pub struct Classifier {
    keywords: Vec<String>,
}

impl Classifier {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// True iff any configured keyword appears in the item text,
    /// case-insensitive, any position. One match suffices.
    pub fn is_relevant(&self, item: &FeedItem) -> bool {
        let text = item.full_text().to_lowercase();
        if text.trim().is_empty() {
            return false;
        }
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    /// Engagement decision ladder; first match wins.
    pub fn decide(&self, item: &FeedItem) -> EngagementAction {
        let text = item.full_text().to_lowercase();

        // Questions deserve answers
        if text.contains('?') {
            if contains_any(&text, ADVICE_PHRASES) {
                return EngagementAction::CommentWithRecommendation;
            }
            return EngagementAction::CommentWithInfo;
        }

        if contains_any(&text, COMPARISON_PHRASES) {
            return EngagementAction::CommentWithComparison;
        }

        // Good content - just upvote
        if item.upvotes > UPVOTE_THRESHOLD || contains_any(&text, POSITIVE_PHRASES) {
            return EngagementAction::UpvoteOnly;
        }

        EngagementAction::ObserveOnly
    }
}

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: Option<&str>, content: Option<&str>, upvotes: u32) -> FeedItem {
        serde_json::from_value(serde_json::json!({
            "id": "t1",
            "title": title,
            "content": content,
            "upvotes": upvotes,
        }))
        .unwrap()
    }

    fn classifier() -> Classifier {
        Classifier::new(&["car".into(), "electric vehicle".into()])
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let c = classifier();
        assert!(c.is_relevant(&item(Some("Thinking about a new CAR"), None, 0)));
        assert!(c.is_relevant(&item(None, Some("electric vehicle charging woes"), 0)));
    }

    #[test]
    fn keyword_can_appear_in_either_field() {
        let c = classifier();
        assert!(c.is_relevant(&item(Some("my car broke"), None, 0)));
        assert!(c.is_relevant(&item(None, Some("my car broke"), 0)));
    }

    #[test]
    fn no_keyword_means_not_relevant() {
        let c = classifier();
        assert!(!c.is_relevant(&item(Some("sourdough starters"), Some("flour talk"), 9)));
    }

    #[test]
    fn empty_text_is_not_relevant() {
        let c = classifier();
        assert!(!c.is_relevant(&item(None, None, 10)));
    }

    #[test]
    fn question_with_advice_phrase_wins_over_everything() {
        let c = classifier();
        let i = item(
            Some("Which car should I buy?"),
            Some("tesla vs bmw, please recommend"),
            100,
        );
        assert_eq!(c.decide(&i), EngagementAction::CommentWithRecommendation);
    }

    #[test]
    fn plain_question_gets_info() {
        let c = classifier();
        let i = item(Some("How does regen braking work?"), None, 0);
        assert_eq!(c.decide(&i), EngagementAction::CommentWithInfo);
    }

    #[test]
    fn comparison_without_question() {
        let c = classifier();
        let i = item(Some("tesla vs bmw"), Some("a long comparison thread"), 0);
        assert_eq!(c.decide(&i), EngagementAction::CommentWithComparison);
    }

    #[test]
    fn high_upvotes_get_upvote_only() {
        let c = classifier();
        let i = item(Some("great build log"), None, 6);
        assert_eq!(c.decide(&i), EngagementAction::UpvoteOnly);
    }

    #[test]
    fn threshold_is_strictly_greater() {
        let c = classifier();
        let i = item(Some("decent build log"), None, 5);
        assert_eq!(c.decide(&i), EngagementAction::ObserveOnly);
    }

    #[test]
    fn positive_phrase_gets_upvote_only() {
        let c = classifier();
        let i = item(Some("what I learned this week"), None, 0);
        assert_eq!(c.decide(&i), EngagementAction::UpvoteOnly);
    }

    #[test]
    fn fallthrough_is_observe_only() {
        let c = classifier();
        let i = item(Some("just a post"), None, 0);
        assert_eq!(c.decide(&i), EngagementAction::ObserveOnly);
    }

    #[test]
    fn decide_is_deterministic() {
        let c = classifier();
        let i = item(Some("tesla vs bmw"), None, 2);
        let first = c.decide(&i);
        for _ in 0..10 {
            assert_eq!(c.decide(&i), first);
        }
    }

    #[test]
    fn comment_action_predicate() {
        assert!(EngagementAction::CommentWithInfo.is_comment());
        assert!(EngagementAction::CommentWithRecommendation.is_comment());
        assert!(!EngagementAction::UpvoteOnly.is_comment());
        assert!(!EngagementAction::ObserveOnly.is_comment());
    }
}
