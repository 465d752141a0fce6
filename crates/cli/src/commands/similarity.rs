//! `chatsieve similarity` — Score two texts.

use std::path::Path;

use chatsieve_filter::normalize::clean_for_similarity;
use chatsieve_filter::{are_similar, similarity};

use super::load_config;

pub fn run(config_path: Option<&Path>, a: &str, b: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let filter = &config.filter;

    let (clean_a, clean_b) = (clean_for_similarity(a), clean_for_similarity(b));
    let score = similarity(&clean_a, &clean_b);
    let similar = are_similar(a, b, filter.similarity_min_length, filter.similarity_threshold);

    println!("  A:          {clean_a:?}");
    println!("  B:          {clean_b:?}");
    println!("  Score:      {score:.4}");
    println!(
        "  Threshold:  {:.2} (min length {})",
        filter.similarity_threshold, filter.similarity_min_length
    );
    println!("  Similar:    {}", if similar { "yes" } else { "no" });
    Ok(())
}
