//! Regional-food category catalog and keyword classifier
//!
//! A fixed, ordered table of Jeju dish categories with their keyword
//! variants (including common misspellings seen in registry and review
//! text). Matching is deliberately first-match-wins in declaration order:
//! keyword sets may overlap, so the catalog order IS the priority order.
//! Matching behavior lives in free functions over the table, not in the
//! enum, so the catalog can be exercised in isolation.

use serde::{Deserialize, Serialize};

/// Stable identifier for a regional-food category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocalFoodCategoryId {
    GogiGuksu,
    GalchiJorim,
    GalchiGui,
    HeukDwaeji,
    JeonbokJuk,
    JeonbokDolsotbap,
    SeonggeMiyeokguk,
    OkdomGui,
    Momguk,
    HanchiMulhoe,
    BomalKalguksu,
    OmegiTteok,
    BingTteok,
    GosariYukgaejang,
}

impl LocalFoodCategoryId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GogiGuksu => "gogi_guksu",
            Self::GalchiJorim => "galchi_jorim",
            Self::GalchiGui => "galchi_gui",
            Self::HeukDwaeji => "heuk_dwaeji",
            Self::JeonbokJuk => "jeonbok_juk",
            Self::JeonbokDolsotbap => "jeonbok_dolsotbap",
            Self::SeonggeMiyeokguk => "seongge_miyeokguk",
            Self::OkdomGui => "okdom_gui",
            Self::Momguk => "momguk",
            Self::HanchiMulhoe => "hanchi_mulhoe",
            Self::BomalKalguksu => "bomal_kalguksu",
            Self::OmegiTteok => "omegi_tteok",
            Self::BingTteok => "bing_tteok",
            Self::GosariYukgaejang => "gosari_yukgaejang",
        }
    }

    pub fn from_str_id(s: &str) -> Option<Self> {
        CATALOG
            .iter()
            .find(|c| c.id.as_str() == s)
            .map(|c| c.id)
    }
}

/// One catalog entry: display metadata plus the ordered keyword variants
/// that identify the dish in free text.
#[derive(Debug, Clone)]
pub struct LocalFoodCategory {
    pub id: LocalFoodCategoryId,
    pub display_name: &'static str,
    pub icon: &'static str,
    pub keywords: &'static [&'static str],
}

/// The curated catalog. Order matters: earlier categories win when keyword
/// sets overlap. Variants are curated offline from registry menu text and
/// review corpora; misspellings are intentional.
pub static CATALOG: &[LocalFoodCategory] = &[
    LocalFoodCategory {
        id: LocalFoodCategoryId::GogiGuksu,
        display_name: "고기국수",
        icon: "ic_food_noodle",
        keywords: &["고기국수", "고기국시", "고깃국수"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::GalchiJorim,
        display_name: "갈치조림",
        icon: "ic_food_braised_fish",
        keywords: &["갈치조림", "갈치졸임", "갈치지짐"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::GalchiGui,
        display_name: "갈치구이",
        icon: "ic_food_grilled_fish",
        keywords: &["갈치구이", "통갈치구이", "갈치구의"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::HeukDwaeji,
        display_name: "흑돼지",
        icon: "ic_food_pork",
        keywords: &["흑돼지", "흙돼지", "흑돗", "제주돼지"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::JeonbokJuk,
        display_name: "전복죽",
        icon: "ic_food_porridge",
        keywords: &["전복죽", "전북죽"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::JeonbokDolsotbap,
        display_name: "전복돌솥밥",
        icon: "ic_food_hotpot_rice",
        keywords: &["전복돌솥밥", "전복솥밥", "전복밥"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::SeonggeMiyeokguk,
        display_name: "성게미역국",
        icon: "ic_food_soup",
        keywords: &["성게미역국", "성게국", "성개미역국"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::OkdomGui,
        display_name: "옥돔구이",
        icon: "ic_food_grilled_fish",
        keywords: &["옥돔구이", "옥돔", "옥둠구이"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::Momguk,
        display_name: "몸국",
        icon: "ic_food_soup",
        keywords: &["몸국", "몹국"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::HanchiMulhoe,
        display_name: "한치물회",
        icon: "ic_food_raw_fish",
        keywords: &["한치물회", "한치회", "한치"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::BomalKalguksu,
        display_name: "보말칼국수",
        icon: "ic_food_noodle",
        keywords: &["보말칼국수", "보말국수", "보말"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::OmegiTteok,
        display_name: "오메기떡",
        icon: "ic_food_rice_cake",
        keywords: &["오메기떡", "오매기떡", "오메기"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::BingTteok,
        display_name: "빙떡",
        icon: "ic_food_rice_cake",
        keywords: &["빙떡"],
    },
    LocalFoodCategory {
        id: LocalFoodCategoryId::GosariYukgaejang,
        display_name: "고사리육개장",
        icon: "ic_food_soup",
        keywords: &["고사리육개장", "고사리해장국"],
    },
];

/// Looks up the catalog entry for an id. Every id variant has exactly one
/// catalog row, so this only returns `None` for a catalog/table mismatch.
pub fn category(id: LocalFoodCategoryId) -> Option<&'static LocalFoodCategory> {
    CATALOG.iter().find(|c| c.id == id)
}

/// Strips everything that is not a Hangul syllable, Latin letter, or digit,
/// lowercasing Latin. Keyword variants are stored pre-normalized but are
/// run through the same function so the invariant cannot drift.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .filter(|c| ('\u{AC00}'..='\u{D7A3}').contains(c) || c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// First category in `catalog` with any keyword variant contained in the
/// normalized text. Returns `None` when nothing matches.
pub fn detect_in<'a>(catalog: &'a [LocalFoodCategory], text: &str) -> Option<&'a LocalFoodCategory> {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return None;
    }
    catalog.iter().find(|category| {
        category
            .keywords
            .iter()
            .any(|keyword| normalized.contains(&normalize_text(keyword)))
    })
}

/// Detects a regional-food category in free text against the curated catalog.
pub fn detect(text: &str) -> Option<&'static LocalFoodCategory> {
    detect_in(CATALOG, text)
}
