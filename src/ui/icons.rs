pub struct Icons;

impl Icons {
    pub const TRUCK: &str = "🚛";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const FILE: &str = "📄";
    pub const DEL: &str = "🗑️";
    pub const PERSON: &str = "👤";
    pub const HOUSE: &str = "🏠";
}
