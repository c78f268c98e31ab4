//! Unit tests for the moderation scorer
use polifinder_backend_lib::moderation::{score_content, Category, ModerationAction};

#[test]
fn test_score_is_bounded() {
    let inputs = [
        "",
        "hello",
        "damn vermin, kill them all, buy now, call 555-123-4567",
        "https://a.example https://b.example https://c.example https://d.example",
    ];
    for input in inputs {
        let result = score_content(input);
        assert!((0.0..=1.0).contains(&result.score), "{input}: {}", result.score);
    }
}

#[test]
fn test_personal_info_alone_is_allowed() {
    let result = score_content("reach the office on 555-123-4567");
    assert_eq!(result.categories, vec![Category::PersonalInfo]);
    assert_eq!(result.action, ModerationAction::Allow);
}

#[test]
fn test_spam_and_personal_info_flag() {
    let result = score_content("Limited offer! email deals@shop.example");
    assert_eq!(result.categories, vec![Category::Spam, Category::PersonalInfo]);
    assert_eq!(result.score, 0.5);
    assert_eq!(result.action, ModerationAction::Flag);
}

#[test]
fn test_hate_is_removed() {
    let result = score_content("Those people are vermin");
    assert_eq!(result.action, ModerationAction::Remove);
}
