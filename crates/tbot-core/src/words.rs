use rand::seq::IndexedRandom;

use crate::ports::WordSource;

const ADJECTIVES: &[&str] = &[
    "able", "amber", "ancient", "autumn", "bold", "brave", "bright", "brisk", "calm", "clever",
    "cool", "crisp", "curly", "daring", "dusty", "eager", "early", "fancy", "fast", "fierce",
    "fluffy", "frosty", "gentle", "giant", "golden", "grand", "happy", "hidden", "hollow",
    "honest", "humble", "icy", "jolly", "keen", "kind", "lively", "lucky", "merry", "mighty",
    "misty", "modest", "noble", "odd", "polite", "proud", "purple", "quick", "quiet", "rapid",
    "royal", "rusty", "shiny", "silent", "silver", "sleepy", "smooth", "snowy", "spicy", "steady",
    "stormy", "sunny", "swift", "tame", "tidy", "tiny", "vivid", "wandering", "warm", "wild",
    "wise", "witty", "young", "zesty",
];

const NOUNS: &[&str] = &[
    "anchor", "apple", "arrow", "badger", "banjo", "beacon", "bison", "breeze", "brook", "cactus",
    "canyon", "castle", "cedar", "comet", "coral", "cricket", "dolphin", "dragon", "falcon",
    "feather", "fern", "forest", "fox", "garden", "glacier", "harbor", "hawk", "island", "jungle",
    "kettle", "lantern", "lemon", "lily", "lion", "maple", "meadow", "meteor", "mountain", "nebula",
    "oak", "ocean", "orchid", "otter", "panda", "pebble", "pepper", "pine", "planet", "pony",
    "puffin", "quartz", "rabbit", "raven", "river", "rocket", "saddle", "salmon", "sparrow",
    "spruce", "star", "summit", "thunder", "tiger", "tulip", "turtle", "valley", "violin",
    "walrus", "willow", "wolf", "yak", "zebra",
];

/// Words drawn uniformly from built-in lists using the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomWords;

impl WordSource for RandomWords {
    fn adjective(&self) -> String {
        pick(ADJECTIVES)
    }

    fn noun(&self) -> String {
        pick(NOUNS)
    }
}

fn pick(list: &[&str]) -> String {
    list.choose(&mut rand::rng())
        .copied()
        .unwrap_or("plain")
        .to_string()
}
