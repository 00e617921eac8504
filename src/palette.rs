//! Built-in color sets the sand painters draw from.

use crate::foundation::core::Rgba8;
use crate::foundation::random::SeededRandom;

struct PaletteDef {
    name: &'static str,
    colors: &'static [[u8; 3]],
}

const PALETTES: &[PaletteDef] = &[
    PaletteDef {
        name: "Pollock",
        colors: &[
            [0x20, 0x1f, 0x1c],
            [0x3a, 0x3d, 0x3b],
            [0x8a, 0x6e, 0x4b],
            [0xc9, 0xa2, 0x6b],
            [0xe8, 0xd8, 0xb5],
            [0x6f, 0x7f, 0x74],
            [0xa8, 0x43, 0x2c],
            [0xf2, 0xee, 0xe3],
        ],
    },
    PaletteDef {
        name: "Ember",
        colors: &[
            [0x3d, 0x0c, 0x02],
            [0x86, 0x1f, 0x0b],
            [0xc7, 0x3e, 0x1d],
            [0xf0, 0x7c, 0x2a],
            [0xfb, 0xb0, 0x4b],
            [0xfd, 0xe3, 0xa7],
        ],
    },
    PaletteDef {
        name: "Glacier",
        colors: &[
            [0x0b, 0x26, 0x3f],
            [0x1e, 0x4f, 0x72],
            [0x3b, 0x83, 0xa8],
            [0x7f, 0xbc, 0xd2],
            [0xc4, 0xe3, 0xed],
            [0xf4, 0xfa, 0xfc],
        ],
    },
    PaletteDef {
        name: "Moss",
        colors: &[
            [0x1f, 0x2a, 0x1b],
            [0x3f, 0x55, 0x2c],
            [0x6b, 0x83, 0x3f],
            [0x9c, 0xad, 0x5e],
            [0xcf, 0xd6, 0x9a],
            [0xb0, 0x8a, 0x4e],
        ],
    },
    PaletteDef {
        name: "Dusk",
        colors: &[
            [0x1a, 0x13, 0x33],
            [0x46, 0x2c, 0x5e],
            [0x84, 0x3b, 0x74],
            [0xc8, 0x58, 0x6f],
            [0xf1, 0x8f, 0x6b],
            [0xfa, 0xd0, 0x8a],
        ],
    },
    PaletteDef {
        name: "Sandstone",
        colors: &[
            [0x5b, 0x3a, 0x29],
            [0x93, 0x5f, 0x3d],
            [0xc2, 0x8b, 0x5a],
            [0xe0, 0xb5, 0x84],
            [0xf3, 0xdc, 0xb8],
            [0x7a, 0x8c, 0x92],
        ],
    },
];

/// Number of built-in palettes.
pub fn palette_count() -> usize {
    PALETTES.len()
}

/// Display name of the palette at `index` (wrapping).
pub fn palette_name(index: usize) -> &'static str {
    PALETTES[index % PALETTES.len()].name
}

/// Cursor into the ordered, cyclable palette list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    index: usize,
}

impl Palette {
    /// Palette at `index`, wrapping past the end of the list.
    pub fn new(index: usize) -> Self {
        Self {
            index: index % PALETTES.len(),
        }
    }

    /// Current palette index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current palette name.
    pub fn name(&self) -> &'static str {
        palette_name(self.index)
    }

    /// Colors of the current palette, fully opaque.
    pub fn colors(&self) -> impl Iterator<Item = Rgba8> + '_ {
        PALETTES[self.index]
            .colors
            .iter()
            .map(|[r, g, b]| Rgba8::opaque(*r, *g, *b))
    }

    /// Advance to the next palette, wrapping around.
    pub fn next_palette(&mut self) {
        self.index = (self.index + 1) % PALETTES.len();
    }

    /// Pick one color of the current palette using the seeded stream.
    pub fn some_color(&self, random: &mut SeededRandom) -> Rgba8 {
        let colors = PALETTES[self.index].colors;
        let [r, g, b] = colors[random.next_index(colors.len())];
        Rgba8::opaque(r, g, b)
    }
}
