//! Property tests for ticker parsing and the multi-panel chart.

mod common;

use common::*;
use marketdash::domain::chart::panels::{Panel, PanelOptions, axis_titles, panel_stack, panels_for};
use marketdash::domain::chart::{Coord, GREEN, RED, Trace};
use marketdash::domain::history::PriceHistory;
use marketdash::domain::indicator::{ATR_COLUMN, MACD_COLUMN, RSI_COLUMN, crossover_column};
use marketdash::domain::tickers::{MAX_TICKERS, parse_tickers};
use proptest::prelude::*;
use std::collections::HashSet;

fn history_from(pairs: &[(f64, f64)]) -> PriceHistory {
    let bars = pairs
        .iter()
        .enumerate()
        .map(|(i, (open, close))| make_bar(i as i64, *open, *close, 500 + i as u64))
        .collect();
    PriceHistory::new("PROP", bars)
}

fn crossover_value() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(Some(1.0)),
        Just(Some(-1.0)),
        Just(Some(0.0)),
        Just(Some(0.5)),
        Just(None),
    ]
}

proptest! {
    #[test]
    fn parsed_tickers_are_unique_and_ordered(tokens in prop::collection::vec("[A-C]{1,2}", 0..30)) {
        let parsed = parse_tickers(&tokens.join(", "));

        let unique: HashSet<_> = parsed.tickers.iter().collect();
        prop_assert_eq!(unique.len(), parsed.tickers.len());
        prop_assert!(parsed.tickers.len() <= MAX_TICKERS);

        let mut expected = Vec::new();
        for token in &tokens {
            if !expected.contains(token) {
                expected.push(token.clone());
            }
        }
        let kept = expected.len().min(MAX_TICKERS);
        prop_assert_eq!(parsed.truncated(), expected.len() > MAX_TICKERS);
        expected.truncate(kept);
        prop_assert_eq!(parsed.tickers, expected);
    }

    #[test]
    fn eleven_or_more_distinct_tickers_keep_first_ten(count in 11usize..40) {
        let input: Vec<String> = (0..count).map(|i| format!("TICK{i}")).collect();
        let parsed = parse_tickers(&input.join(","));
        prop_assert_eq!(parsed.tickers, input[..10].to_vec());
        prop_assert_eq!(parsed.dropped, count - 10);
    }

    #[test]
    fn panels_follow_fixed_order(
        volume in any::<bool>(),
        macd in any::<bool>(),
        atr in any::<bool>(),
        rsi in any::<bool>(),
    ) {
        let mut history = history_from(&[(10.0, 11.0), (11.0, 10.5), (10.5, 12.0)]);
        for (present, column) in [(rsi, RSI_COLUMN), (atr, ATR_COLUMN), (macd, MACD_COLUMN)] {
            if present {
                history = history.with_column(column, vec![Some(1.0); 3]);
            }
        }
        let options = PanelOptions { volume, ..PanelOptions::default() };

        let expected: Vec<Panel> = [
            (volume, Panel::Volume),
            (macd, Panel::Macd),
            (atr, Panel::Atr),
            (rsi, Panel::Rsi),
        ]
        .into_iter()
        .filter_map(|(present, panel)| present.then_some(panel))
        .collect();
        prop_assert_eq!(panels_for(&history, &options), expected.clone());

        let titles = axis_titles(&panel_stack(&history, &options));
        prop_assert_eq!(titles.len(), 1 + expected.len());
        let panel_titles: Vec<String> = expected.iter().map(|p| p.title().to_string()).collect();
        prop_assert_eq!(&titles[1..], panel_titles.as_slice());
    }

    #[test]
    fn volume_bars_colored_by_direction(
        pairs in prop::collection::vec((1.0f64..500.0, 1.0f64..500.0), 1..40),
    ) {
        let history = history_from(&pairs);
        let figure = panel_stack(&history, &PanelOptions::default());

        let colors = figure
            .data
            .iter()
            .find_map(|t| match t {
                Trace::Bar(bar) if bar.name == "Volume" => Some(bar.marker.color.clone()),
                _ => None,
            })
            .unwrap();

        prop_assert_eq!(colors.len(), pairs.len());
        for ((open, close), color) in pairs.iter().zip(&colors) {
            let expected = if close > open { GREEN } else { RED };
            prop_assert_eq!(color.as_str(), expected);
        }
    }

    #[test]
    fn crossover_annotations_match_markers(markers in prop::collection::vec(crossover_value(), 1..40)) {
        let n = markers.len();
        let pairs: Vec<(f64, f64)> = (0..n).map(|i| (100.0 + i as f64, 101.0 + i as f64)).collect();
        let sma: Vec<Option<f64>> = (0..n).map(|i| Some(50.0 + i as f64)).collect();
        let history = history_from(&pairs)
            .with_column("SMA_20", sma)
            .with_column(crossover_column(20, 50), markers.clone());
        let labels = history.labels();

        let figure = panel_stack(&history, &PanelOptions::default());
        let crosses: Vec<_> = figure
            .layout
            .annotations
            .iter()
            .filter(|a| a.text == "Golden cross" || a.text == "Death cross")
            .collect();

        let expected: Vec<(usize, &str)> = markers
            .iter()
            .enumerate()
            .filter_map(|(i, m)| match m {
                Some(v) if *v == 1.0 => Some((i, "Golden cross")),
                Some(v) if *v == -1.0 => Some((i, "Death cross")),
                _ => None,
            })
            .collect();

        prop_assert_eq!(crosses.len(), expected.len());
        for (annotation, (i, text)) in crosses.iter().zip(&expected) {
            prop_assert_eq!(annotation.text.as_str(), *text);
            prop_assert_eq!(&annotation.x, &Coord::Category(labels[*i].clone()));
            prop_assert_eq!(annotation.y, 50.0 + *i as f64);
        }
    }
}
