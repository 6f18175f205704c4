use anyhow::{Context, Result};
use digest_core::ChannelResult;

pub const TOP_CONTRIBUTORS: usize = 3;

/// Digest text for `focus`, with every other channel listed for comparison.
pub fn render_digest(results: &[ChannelResult], focus: &str, days: u32) -> Result<String> {
    let focused = results
        .iter()
        .find(|result| result.channel.name == focus)
        .with_context(|| format!("no stats collected for channel `{focus}`"))?;

    let mut lines = vec![
        format!("<!here> *Here's your :postbox: summary of the last {days} days :calendar::*"),
        String::new(),
        "This time:".to_string(),
        format!("- {}", channel_line(focused)),
    ];

    let siblings: Vec<String> = results
        .iter()
        .filter(|result| result.channel.name != focus)
        .map(|result| format!("- {}", channel_line(result)))
        .collect();
    if !siblings.is_empty() {
        lines.push("For comparison, our sibling channels produced:".to_string());
        lines.extend(siblings);
    }

    lines.push(String::new());
    lines.push(format!("Most active in {}:", focused.channel.icon));
    if focused.contributors.is_empty() {
        lines.push(" - nobody yet, the podium is free :eyes:".to_string());
    } else {
        lines.extend(
            focused
                .contributors
                .iter()
                .take(TOP_CONTRIBUTORS)
                .map(|user| {
                    format!(
                        " - <@{}> ({} :heavy_multiplication_x::memo:)",
                        user.user_id, user.count
                    )
                }),
        );
    }

    lines.push(String::new());
    lines.push(
        "_Keep writing :writing_hand::skin-tone-5: and leaving emoji :upside_down_face: under \
         messages so nobody feels alone :alien:!_"
            .to_string(),
    );

    Ok(lines.join("\n"))
}

pub fn channel_line(result: &ChannelResult) -> String {
    format!(
        "{} {} topics, {} emoji, and as many as {} replies",
        result.channel.icon, result.stats.questions, result.stats.reactions, result.stats.replies
    )
}

#[cfg(test)]
mod tests {
    use digest_core::{ChannelConfig, Stats, UserStat};

    use super::*;

    fn result(name: &str, icon: &str, questions: u64, contributors: &[(&str, u64)]) -> ChannelResult {
        ChannelResult {
            channel: ChannelConfig::new(name, icon),
            channel_id: format!("C-{name}"),
            stats: Stats {
                questions,
                reactions: questions * 2,
                replies: questions * 3,
                ..Default::default()
            },
            contributors: contributors
                .iter()
                .map(|(id, count)| UserStat {
                    user_id: id.to_string(),
                    display_name: id.to_lowercase(),
                    count: *count,
                })
                .collect(),
        }
    }

    fn results() -> Vec<ChannelResult> {
        vec![
            result(
                "android-talks",
                ":android:",
                12,
                &[("U1", 9), ("U2", 5), ("U3", 4), ("U4", 1)],
            ),
            result("ios-talks", ":apple:", 4, &[("U9", 2)]),
            result("flutter-talks", ":flutter:", 0, &[]),
        ]
    }

    #[test]
    fn focus_channel_leads_and_siblings_follow_in_order() {
        let text = render_digest(&results(), "ios-talks", 30).unwrap();
        assert!(text.contains("summary of the last 30 days"));

        let focus = text.find(":apple: 4 topics, 8 emoji, and as many as 12 replies").unwrap();
        let android = text.find("- :android: 12 topics").unwrap();
        let flutter = text.find("- :flutter: 0 topics").unwrap();
        assert!(focus < android && android < flutter);
        assert!(text.contains("Most active in :apple::\n - <@U9> (2 "));
    }

    #[test]
    fn only_top_three_contributors_are_listed() {
        let text = render_digest(&results(), "android-talks", 7).unwrap();
        assert!(text.contains("<@U1> (9 "));
        assert!(text.contains("<@U3> (4 "));
        assert!(!text.contains("<@U4>"));
        assert!(text.find("<@U1>").unwrap() < text.find("<@U2>").unwrap());
    }

    #[test]
    fn empty_podium_gets_a_placeholder() {
        let text = render_digest(&results(), "flutter-talks", 30).unwrap();
        assert!(text.contains("nobody yet"));
    }

    #[test]
    fn single_channel_skips_comparison() {
        let only = vec![result("ios-talks", ":apple:", 1, &[])];
        let text = render_digest(&only, "ios-talks", 30).unwrap();
        assert!(!text.contains("For comparison"));
    }

    #[test]
    fn unknown_focus_is_an_error() {
        assert!(render_digest(&results(), "kotlin-talks", 30).is_err());
    }
}
