//! Poll summary card used by the feed and "My Polls"

use leptos::*;
use leptos_router::*;

use crate::api::PollSummary;

/// Shown when a poll has no description
pub const NO_DESCRIPTION: &str = "No description provided for this poll.";

#[component]
pub fn PollCard(
    poll: PollSummary,
    /// Extra controls rendered under the summary
    #[prop(optional)]
    children: Option<Children>,
) -> impl IntoView {
    let description = poll
        .description
        .clone()
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());
    let created = poll.created_at.format("%b %e, %Y").to_string();
    let href = poll.share_path.clone();

    view! {
        <div class="bg-gray-800 rounded-xl p-5 space-y-2">
            <A href=href class="block text-lg font-semibold hover:text-primary-400">
                {poll.question.clone()}
            </A>
            <p class="text-gray-400 text-sm">{description}</p>
            <div class="flex items-center space-x-4 text-xs text-gray-500">
                <span>{format!("by {}", poll.creator_name)}</span>
                <span>{format!("Created {}", created)}</span>
                <span>{format!("{} votes", poll.total_votes)}</span>
                <span class="uppercase">{poll.visibility.clone()}</span>
            </div>
            {children.map(|c| c())}
        </div>
    }
}
