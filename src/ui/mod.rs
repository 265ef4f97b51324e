pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    header, info, muted, record, record_changed, record_created, record_deleted,
    section, status, success, summary_row, warn,
};
pub use table::{stats_table, TableBuilder};
pub use theme::{theme, Theme};
