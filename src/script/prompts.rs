//! Prompt templates for the three script requests.

pub const LONG_SCRIPT_TOKENS: u32 = 1400;
pub const SHORT_SCRIPT_TOKENS: u32 = 300;
pub const METADATA_TOKENS: u32 = 250;

pub fn long_script(topic: &str, minutes: u32) -> String {
    format!(
        "You are an expert motivational financial coach. Produce an {minutes}-minute YouTube video script for the topic:\n\
         {topic}\n\
         Structure: Hook (10-20s), 6-8 points with short examples, transitions, and a strong call-to-action. \
         Return only the script (no headers)."
    )
}

pub fn short_script(topic: &str) -> String {
    format!(
        "Write a 50-60 second high-energy hook script for the same topic: {topic}. \
         Make it punchy and perfect for a Short."
    )
}

pub fn metadata(topic: &str) -> String {
    format!(
        "From this topic: {topic}, create:\n\
         1) A clickable YouTube title under 80 chars.\n\
         2) A 2-sentence SEO-friendly description with a call to action and placeholder for affiliate links: [AFF_LINKS]\n\
         3) 8 tags (comma-separated).\n\
         Return as JSON: {{ \"title\": \"...\", \"description\": \"...\", \"tags\": [\"a\",\"b\"] }} only."
    )
}
