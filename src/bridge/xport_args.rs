// In: src/bridge/xport_args.rs

/// Builds the argument vector `rrd_xport` parses, getopt style.
///
/// `argv[0]` is the program name librrd expects. `--maxrows` is only passed
/// for a positive row limit; the remaining `defs` (DEF/CDEF/XPORT
/// statements) follow the options unchanged.
pub fn xport_argv<S: AsRef<str>>(start: i64, end: i64, step: i64, maxrows: i64, defs: &[S]) -> Vec<String> {
    let mut argv = Vec::with_capacity(9 + defs.len());
    argv.push("xport".to_string());
    argv.push("--start".to_string());
    argv.push(start.to_string());
    argv.push("--end".to_string());
    argv.push(end.to_string());
    argv.push("--step".to_string());
    argv.push(step.to_string());
    if maxrows > 0 {
        argv.push("--maxrows".to_string());
        argv.push(maxrows.to_string());
    }
    argv.extend(defs.iter().map(|d| d.as_ref().to_string()));
    argv
}
