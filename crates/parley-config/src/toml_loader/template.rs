//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Parley Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[api]
# base_url = "https://api.deepseek.com/v1"
# api_key = ""                 # empty = read DEEPSEEK_API_KEY
# model = "deepseek-reasoner"  # deepseek-chat, deepseek-reasoner, ...
# connect_timeout_secs = 10    # 1-120
# request_timeout_secs = 120   # 5-900

[session]
# system_prompt = "You are a helpful assistant."
# max_history_tokens = 1000    # 100-1000000

[rate_limit]
# requests_per_minute = 20     # 1-10000
# acquire_timeout_secs = 30    # unset = wait indefinitely, 0 = never block

[retry]
# max_retries = 2              # 0-5
# rate_limit_backoff_secs = 20 # 0-300
# timeout_backoff_secs = 5     # 0-300

[logging]
# level = "info"               # debug, info, warn, error
"##
    .to_string()
}
