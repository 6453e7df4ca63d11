use clap::Parser;

use crate::app::state::Mood;

/// Generate a playlist that matches how you feel.
#[derive(Parser, Debug)]
#[command(name = "emolody")]
#[command(version)]
pub struct Args {
    /// Mood to generate for (happy, sad, energetic, calm, focused, romantic)
    #[arg(value_parser = parse_mood, required_unless_present = "list_moods")]
    pub mood: Option<Mood>,

    /// Save the generated playlist to the connected service
    #[arg(long)]
    pub save: bool,

    /// Fixed seed for the offline shuffle; overrides EMOLODY_SHUFFLE_SEED
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the supported moods and exit
    #[arg(long)]
    pub list_moods: bool,
}

fn parse_mood(raw: &str) -> Result<Mood, String> {
    raw.parse::<Mood>().map_err(|_| {
        use strum::IntoEnumIterator;
        let known: Vec<String> = Mood::iter().map(|m| m.to_string().to_lowercase()).collect();
        format!("unknown mood '{raw}', expected one of: {}", known.join(", "))
    })
}
