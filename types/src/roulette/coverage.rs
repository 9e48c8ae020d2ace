//! Table positions and the numbers they cover.
//!
//! The layout is the standard three-column grid: row `r` (0-11) holds `3r+1`, `3r+2`, `3r+3`;
//! column `c` (0-2) holds every number with `(n - 1) % 3 == c`. `0` sits above `1`/`2`, `00`
//! above `2`/`3`.

use std::collections::BTreeSet;

use super::{
    BetType, Pocket, PocketColor, DEFAULT_NEIGHBOR_SPAN, ORPHELINS, POCKET_COUNT, TIERS, VOISINS,
};

/// Splits across the zeros allowed on a double-zero layout.
const ZERO_SPLITS: [(u8, u8); 5] = [(0, 37), (0, 1), (0, 2), (37, 2), (37, 3)];

fn set(values: impl IntoIterator<Item = u8>) -> BTreeSet<Pocket> {
    values
        .into_iter()
        .filter_map(|value| Pocket::new(value).ok())
        .collect()
}

fn numbers() -> impl Iterator<Item = u8> {
    1..=36u8
}

pub fn straight(pocket: Pocket) -> BTreeSet<Pocket> {
    BTreeSet::from([pocket])
}

/// Two adjacent numbers, or one of the zero splits. `None` if not adjacent.
pub fn split(a: Pocket, b: Pocket) -> Option<BTreeSet<Pocket>> {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let adjacent = match (low.table_number(), high.table_number()) {
        (Some(x), Some(y)) => (y == x + 1 && x % 3 != 0) || y == x + 3,
        _ => ZERO_SPLITS.contains(&(low.value(), high.value()))
            || ZERO_SPLITS.contains(&(high.value(), low.value())),
    };
    adjacent.then(|| BTreeSet::from([low, high]))
}

/// Row `0..12`.
pub fn street(row: u8) -> Option<BTreeSet<Pocket>> {
    (row < 12).then(|| set((1..=3).map(|offset| row * 3 + offset)))
}

/// Block of four with `top_left` as its lowest number. `None` when `top_left` is in the third
/// column or the last row.
pub fn corner(top_left: u8) -> Option<BTreeSet<Pocket>> {
    let valid = (1..=32).contains(&top_left) && top_left % 3 != 0;
    valid.then(|| set([top_left, top_left + 1, top_left + 3, top_left + 4]))
}

/// Two consecutive rows starting at `row` (`0..11`).
pub fn line(row: u8) -> Option<BTreeSet<Pocket>> {
    (row < 11).then(|| set((1..=6).map(|offset| row * 3 + offset)))
}

/// Column `0..3`; column 0 starts at 1.
pub fn column(index: u8) -> Option<BTreeSet<Pocket>> {
    (index < 3).then(|| set(numbers().filter(|n| (n - 1) % 3 == index)))
}

/// Dozen `0..3`; dozen 0 is 1-12.
pub fn dozen(index: u8) -> Option<BTreeSet<Pocket>> {
    (index < 3).then(|| set((1..=12).map(|offset| index * 12 + offset)))
}

pub fn color(color: PocketColor) -> BTreeSet<Pocket> {
    numbers()
        .filter_map(|n| Pocket::new(n).ok())
        .filter(|pocket| pocket.color() == color)
        .collect()
}

pub fn even() -> BTreeSet<Pocket> {
    set(numbers().filter(|n| n % 2 == 0))
}

pub fn odd() -> BTreeSet<Pocket> {
    set(numbers().filter(|n| n % 2 == 1))
}

pub fn low() -> BTreeSet<Pocket> {
    set(1..=18)
}

pub fn high() -> BTreeSet<Pocket> {
    set(19..=36)
}

pub fn zero() -> BTreeSet<Pocket> {
    straight(Pocket::ZERO)
}

pub fn double_zero() -> BTreeSet<Pocket> {
    straight(Pocket::DOUBLE_ZERO)
}

pub fn voisins() -> BTreeSet<Pocket> {
    set(VOISINS)
}

pub fn tiers() -> BTreeSet<Pocket> {
    set(TIERS)
}

pub fn orphelins() -> BTreeSet<Pocket> {
    set(ORPHELINS)
}

/// `center` plus `span` wheel neighbours on each side.
pub fn neighbors(center: Pocket, span: usize) -> BTreeSet<Pocket> {
    let span = span.min((POCKET_COUNT - 1) / 2);
    let origin = center.wheel_index() + POCKET_COUNT;
    (origin - span..=origin + span)
        .map(|index| Pocket::at_wheel_index(index % POCKET_COUNT))
        .collect()
}

/// `center` plus the default two neighbours on each side.
pub fn default_neighbors(center: Pocket) -> BTreeSet<Pocket> {
    neighbors(center, DEFAULT_NEIGHBOR_SPAN)
}

/// Whether `covered` is exactly what some table position of `bet_type` covers.
pub fn is_valid(bet_type: BetType, covered: &BTreeSet<Pocket>) -> bool {
    match bet_type {
        BetType::Straight => covered.len() == 1,
        BetType::Zero => covered.len() == 1 && covered.iter().all(Pocket::is_zero),
        BetType::Split => {
            let mut iter = covered.iter();
            match (iter.next(), iter.next(), iter.next()) {
                (Some(a), Some(b), None) => split(*a, *b).is_some(),
                _ => false,
            }
        }
        BetType::Street => (0..12).filter_map(street).any(|s| &s == covered),
        BetType::Corner => (1..=32).filter_map(corner).any(|c| &c == covered),
        BetType::Line => (0..11).filter_map(line).any(|l| &l == covered),
        BetType::Column => (0..3).filter_map(column).any(|c| &c == covered),
        BetType::Dozen => (0..3).filter_map(dozen).any(|d| &d == covered),
        BetType::RedBlack => {
            covered == &color(PocketColor::Red) || covered == &color(PocketColor::Black)
        }
        BetType::EvenOdd => covered == &even() || covered == &odd(),
        BetType::HighLow => covered == &low() || covered == &high(),
        BetType::Voisins => covered == &voisins(),
        BetType::Tiers => covered == &tiers(),
        BetType::Orphelins => covered == &orphelins(),
        // Only the racetrack's fixed five-pocket arc.
        BetType::Neighbors => {
            covered.len() == DEFAULT_NEIGHBOR_SPAN * 2 + 1
                && covered.iter().any(|center| &default_neighbors(*center) == covered)
        }
    }
}
