pub mod config;
pub mod convert;
pub mod error;
pub mod filter;
pub mod model;
pub mod paths;
pub mod poller;
pub mod service;
pub mod state;
pub mod time;

pub use config::{
    DefaultsConfig, LoggingConfig, PollingConfig, ServiceConfig, TzviewConfig, CONFIG_TEMPLATE,
    DEFAULT_BASE_URL,
};
pub use convert::ConversionRequester;
pub use error::{CoreError, ServiceError};
pub use filter::{filter_time_zones, FilteredList};
pub use model::{ConversionRequest, ConversionResult, CurrentTime, TimeZoneEntry};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use poller::{PollKind, Poller};
pub use service::TimeZoneService;
pub use state::{
    ClientState, Outcome, Slot, Ticket, ViewEvent, ViewModel, CURRENT_TIME_PLACEHOLDER,
};
pub use time::{datetime_input_now, parse_datetime_input, DATETIME_INPUT_FORMAT};
