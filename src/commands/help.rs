//! Help and version output.

/// Display the full usage text.
pub fn display_help() {
    log_version!();
    log_block_start!("Usage: timeslot [OPTIONS] [COMMAND]");
    log_block_start!("Commands:");
    log_indented!("status [--json]           Show the published state of all slots");
    log_indented!("reload, r                 Reload the running daemon's configuration");
    log_indented!("on <id>                   Enable a slot");
    log_indented!("off <id>                  Disable a slot");
    log_indented!("toggle <id>               Invert a slot's enabled flag");
    log_indented!("set, s <id> <field> <value> [...]");
    log_indented!("                          Update slot fields (name, enabled, start, end)");
    log_indented!("simulate <start> <end> [multiplier | --fast-forward] [--log]");
    log_indented!("                          Run against simulated time (\"YYYY-MM-DD HH:MM:SS\")");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>        Use a custom configuration directory");
    log_indented!("-d, --debug               Enable debug output");
    log_indented!("-h, --help                Print help");
    log_indented!("-V, --version             Print version");
    log_block_start!("Running with no command starts the daemon in the foreground.");
    log_block_start!("Examples:");
    log_indented!("timeslot                           # start the daemon");
    log_indented!("timeslot toggle night              # flip the 'night' slot");
    log_indented!("timeslot set work start 09:00:00   # move the window start");
    log_end!();
}

/// Display version information.
pub fn display_version() {
    log_version!();
    log_block_start!("A time window switch daemon");
    log_indented!("Slots publish on/off state as wall-clock windows open and close");
    log_end!();
}
