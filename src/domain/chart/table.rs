//! Two-column table figure for metadata and market overview tables.

use crate::domain::chart::{
    Figure, Fill, LIGHT_GREY, Layout, Margin, TableSection, TableTrace, Trace, WHITE,
};
use crate::domain::table::Table;

pub const TABLE_HEIGHT: u32 = 270;

pub fn table_figure(table: &Table) -> Figure {
    let trace = TableTrace {
        header: TableSection {
            values: table.columns().iter().map(|c| vec![c.clone()]).collect(),
            fill: Fill {
                color: LIGHT_GREY.into(),
            },
            align: vec!["center".into()],
        },
        cells: TableSection {
            values: table.column_values(),
            fill: Fill {
                color: WHITE.into(),
            },
            align: vec!["left".into(), "right".into()],
        },
        columnwidth: vec![0.6, 0.4],
    };

    Figure {
        data: vec![Trace::Table(trace)],
        layout: Layout {
            height: Some(TABLE_HEIGHT),
            margin: Some(Margin {
                t: 0,
                b: 0,
                l: 0,
                r: 0,
            }),
            ..Layout::default()
        },
    }
}
