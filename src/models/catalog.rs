use super::{CreateFeatureInput, FeatureCategory};

/// The wishlist the site launches with.
pub fn default_features() -> Vec<CreateFeatureInput> {
    let entry = |id: &str, title: &str, description: &str, category| CreateFeatureInput {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category,
        vote_count: None,
        is_live: false,
    };

    vec![
        entry(
            "feat_formatter",
            "Thesis Formatting Lifesaver",
            "Drop in a Word file and get APA/MLA formatting, table of contents and page numbers fixed.",
            FeatureCategory::Web,
        ),
        entry(
            "feat_mirror",
            "AI Mock Interviewer",
            "Upload a resume and rehearse out loud with an AI interviewer, then review a transcript scored for confidence and structure.",
            FeatureCategory::Web,
        ),
        entry(
            "feat_slide",
            "Presentation Outline Generator",
            "Enter a topic and get a slide-by-slide skeleton with speaker notes.",
            FeatureCategory::Web,
        ),
        entry(
            "feat_synapse",
            "Thesis Idea Weaver",
            "Feed in scattered reading notes and get the connections between them laid out as an outline.",
            FeatureCategory::Desktop,
        ),
        entry(
            "feat_ghost",
            "Ghost Study Room",
            "Study alongside other focused people online. No faces, no chat, just the presence of company.",
            FeatureCategory::Extension,
        ),
        entry(
            "feat_nap",
            "Power Nap Recharge",
            "A 20-minute audio-guided nap timed to your body clock, with a wake-up before grogginess sets in.",
            FeatureCategory::Mobile,
        ),
    ]
}
