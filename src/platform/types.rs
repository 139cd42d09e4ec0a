use serde::Deserialize;

/// One unit of remote content, post or comment. Parsed from a fetch
/// response, immutable, discarded after the cycle that fetched it.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedItem {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Post,
    Comment,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

impl FeedItem {
    /// Title and content concatenated for relevance analysis.
    pub fn full_text(&self) -> String {
        let mut text = String::new();
        if let Some(title) = &self.title {
            text.push_str(title);
            text.push(' ');
        }
        if let Some(content) = &self.content {
            text.push_str(content);
        }
        text
    }

    pub fn author_name(&self) -> &str {
        self.author.as_ref().map_or("unknown", |a| a.name.as_str())
    }

    /// Title for ledger entries, falling back to the author attribution.
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("Post by @{}", self.author_name()))
    }
}

/// Feed-shaped responses come in two wire forms: `{"posts": [...]}` from
/// the feed/posts endpoints and `{"results": [...]}` from search. Either
/// (or both) may be present; missing keys mean an empty page.
#[derive(Debug, Default, Deserialize)]
pub struct FeedEnvelope {
    #[serde(default)]
    pub posts: Vec<FeedItem>,
    #[serde(default)]
    pub results: Vec<FeedItem>,
}

impl FeedEnvelope {
    pub fn items(self) -> Vec<FeedItem> {
        let mut items = self.posts;
        items.extend(self.results);
        items
    }
}

#[derive(Debug, Deserialize)]
pub struct AgentStatus {
    #[serde(default)]
    pub status: String,
}

impl AgentStatus {
    pub fn is_claimed(&self) -> bool {
        self.status == "claimed"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationChallenge {
    pub code: String,
    pub challenge: String,
}

/// Response to creating a post. A verification challenge, when present,
/// must be solved before the post is published.
#[derive(Debug, Deserialize)]
pub struct PostReceipt {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub verification: Option<VerificationChallenge>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileEnvelope {
    #[serde(default)]
    pub agent: Option<AgentProfile>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AgentProfile {
    #[serde(default)]
    pub pending_posts: Vec<PendingPost>,
}

#[derive(Debug, Deserialize)]
pub struct PendingPost {
    pub id: String,
    #[serde(default)]
    pub verification: Option<VerificationChallenge>,
}

impl ProfileEnvelope {
    pub fn pending_posts(self) -> Vec<PendingPost> {
        self.agent.map(|a| a.pending_posts).unwrap_or_default()
    }
}

/// Error payload shape shared by the side-effecting endpoints. Retry hints
/// use minutes for posts and seconds for comments.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub retry_after_seconds: Option<u64>,
    #[serde(default)]
    pub retry_after_minutes: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationReceipt {
    pub agent: RegisteredAgent,
}

#[derive(Debug, Deserialize)]
pub struct RegisteredAgent {
    pub api_key: String,
    #[serde(default)]
    pub claim_url: Option<String>,
    #[serde(default)]
    pub verification_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_posts_shape() {
        let json = r#"{"posts":[{"id":"p1","type":"post","title":"Hello","upvotes":3,
            "author":{"name":"crabby"}}]}"#;
        let envelope: FeedEnvelope = serde_json::from_str(json).unwrap();
        let items = envelope.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "p1");
        assert_eq!(items[0].kind, ItemKind::Post);
        assert_eq!(items[0].author_name(), "crabby");
    }

    #[test]
    fn parses_results_shape() {
        let json = r#"{"results":[{"id":"s1","content":"found you"}]}"#;
        let envelope: FeedEnvelope = serde_json::from_str(json).unwrap();
        let items = envelope.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].full_text(), "found you");
    }

    #[test]
    fn missing_both_keys_is_empty() {
        let envelope: FeedEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.items().is_empty());
    }

    #[test]
    fn full_text_concatenates_title_and_content() {
        let json = r#"{"id":"p1","title":"EV range","content":"any tips?"}"#;
        let item: FeedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.full_text(), "EV range any tips?");
    }

    #[test]
    fn display_title_falls_back_to_author() {
        let json = r#"{"id":"p1","content":"untitled","author":{"name":"molty"}}"#;
        let item: FeedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.display_title(), "Post by @molty");
    }

    #[test]
    fn unknown_item_kind_does_not_fail_parsing() {
        let json = r#"{"id":"p1","type":"link"}"#;
        let item: FeedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, ItemKind::Other);
    }

    #[test]
    fn status_claimed() {
        let status: AgentStatus = serde_json::from_str(r#"{"status":"claimed"}"#).unwrap();
        assert!(status.is_claimed());
        let status: AgentStatus = serde_json::from_str(r#"{"status":"pending_claim"}"#).unwrap();
        assert!(!status.is_claimed());
    }

    #[test]
    fn post_receipt_with_verification() {
        let json = r#"{"id":"new-post","verification":{"code":"v123","challenge":"obfuscated"}}"#;
        let receipt: PostReceipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.id.as_deref(), Some("new-post"));
        assert_eq!(receipt.verification.unwrap().code, "v123");
    }

    #[test]
    fn profile_flattens_pending_posts() {
        let json = r#"{"agent":{"pending_posts":[
            {"id":"pp1","verification":{"code":"c1","challenge":"x"}},
            {"id":"pp2"}]}}"#;
        let profile: ProfileEnvelope = serde_json::from_str(json).unwrap();
        let pending = profile.pending_posts();
        assert_eq!(pending.len(), 2);
        assert!(pending[0].verification.is_some());
        assert!(pending[1].verification.is_none());
    }

    #[test]
    fn profile_without_agent_is_empty() {
        let profile: ProfileEnvelope = serde_json::from_str("{}").unwrap();
        assert!(profile.pending_posts().is_empty());
    }

    #[test]
    fn error_body_retry_hints() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error":"Too Many Requests","retry_after_seconds":45}"#)
                .unwrap();
        assert_eq!(body.retry_after_seconds, Some(45));
        assert_eq!(body.retry_after_minutes, None);
    }
}
