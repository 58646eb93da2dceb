pub mod callback; // skipcq: RS-D1001

pub mod card; // skipcq: RS-D1001

pub mod chain; // skipcq: RS-D1001

pub mod config; // skipcq: RS-D1001

pub mod errors; // skipcq: RS-D1001

pub mod policy; // skipcq: RS-D1001

pub mod prelude; // skipcq: RS-D1001

pub mod proxy; // skipcq: RS-D1001

pub mod source; // skipcq: RS-D1001

pub mod strategy; // skipcq: RS-D1001
