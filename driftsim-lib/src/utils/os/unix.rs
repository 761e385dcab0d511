use rama::telemetry::tracing;

pub use libc::rlim_t;

/// Raise the soft limit of open file descriptors to `target`,
/// capped by the hard limit. Never lowers the current soft limit.
///
/// Returns the soft limit in effect afterwards.
pub fn raise_nofile(target: rlim_t) -> std::io::Result<rlim_t> {
    let mut limit = get_nofile()?;
    let desired = target.min(limit.rlim_max);

    if limit.rlim_cur >= desired {
        tracing::debug!(
            current = limit.rlim_cur,
            desired,
            "ulimit: current soft limit suffices",
        );
        return Ok(limit.rlim_cur);
    }

    let previous = limit.rlim_cur;
    limit.rlim_cur = desired;

    // SAFETY: `limit` is a fully initialised rlimit
    if unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, &limit) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    tracing::info!(previous, current = desired, "ulimit: raised soft limit");
    Ok(desired)
}

fn get_nofile() -> std::io::Result<libc::rlimit> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };

    // SAFETY: getrlimit only writes into the provided rlimit
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    Ok(limit)
}
