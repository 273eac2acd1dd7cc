pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, muted, success, summary_row, warn};
pub use progress::Spinner;
pub use table::{detail_table, service_table, TableBuilder};
pub use theme::{theme, Theme};
