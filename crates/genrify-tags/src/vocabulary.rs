// SPDX-License-Identifier: GPL-3.0-or-later

/// Seed score for the ID3 base genres.
pub const BASE_SEED_SCORE: f64 = 0.05;

/// Seed score for the extended genre list.
pub const EXTENDED_SEED_SCORE: f64 = 0.1;

/// Seed score for operator boosted genres; penalized genres get the negation.
pub const PREFERENCE_SEED_SCORE: f64 = 0.2;

/// Genre names from the ID3v1 genre table (with Winamp extensions).
pub const BASE_GENRES: &[&str] = &[
    "Acapella", "Acid", "Acid Jazz", "Acid Punk", "Acoustic", "Alternative",
    "Alternative Rock", "Ambient", "Anime", "Avantgarde", "Ballad", "Bass", "Beats",
    "Bebob", "Big Band", "Black Metal", "Bluegrass", "Blues", "Booty Bass", "BritPop",
    "Cabaret", "Celtic", "Chamber Music", "Chanson", "Chorus", "Christian",
    "Classic Rock", "Classical", "Club", "Comedy", "Country", "Crossover", "Cult",
    "Dance", "Dance Hall", "Darkwave", "Death Metal", "Disco", "Dream", "Drum & Bass",
    "Easy Listening", "Electronic", "Ethnic", "Euro-House", "Euro-Techno", "Euro-Dance",
    "Fast Fusion", "Folk", "Folk-Rock", "Freestyle", "Funk", "Fusion", "Gangsta", "Goa",
    "Gospel", "Gothic", "Gothic Rock", "Grunge", "Hard Rock", "Hardcore", "Heavy Metal",
    "Hip-Hop", "House", "Indie", "Industrial", "Instrumental", "Jazz", "Jazz+Funk",
    "Jungle", "Latin", "Lo-Fi", "Meditative", "Metal", "Musical", "New Age", "New Wave",
    "Noise", "Oldies", "Opera", "Other", "Pop", "Progressive Rock", "Psychedelic",
    "Psychedelic Rock", "Punk", "Punk Rock", "R&B", "Rap", "Rave", "Reggae", "Retro",
    "Revival", "Rhythmic Soul", "Rock", "Rock & Roll", "Salsa", "Samba", "Ska", "Slow Jam",
    "Slow Rock", "Sonata", "Soul", "Soundtrack", "Southern Rock", "Space", "Speech",
    "Swing", "Symphonic Rock", "Symphony", "Synthpop", "Tango", "Techno", "Thrash Metal",
    "Trance", "Tribal", "Trip-Hop", "Vocal",
];

/// Common genres missing from the ID3 table.
pub const EXTENDED_GENRES: &[&str] = &[
    "Chillout", "Downtempo", "Electro-Swing", "Female Vocalist", "Future Jazz",
    "German", "German Hip-Hop", "Jazz-Hop", "Tech-House",
];
