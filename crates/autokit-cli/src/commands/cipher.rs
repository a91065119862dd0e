//! pgp commands

use autokit_core::{CipherRequest, CipherSession, GpgBackend};

use super::{Context, Status, print_report};
use crate::cli::{CipherAction, CipherArgs};
use crate::error::Result;

pub fn run_cipher(ctx: &Context, action: CipherAction) -> Result<Status> {
    let (encrypt, args) = match action {
        CipherAction::Encrypt(args) => (true, args),
        CipherAction::Decrypt(args) => (false, args),
    };

    let settings = ctx.settings()?;
    let profile = ctx.resolver(&settings)?.resolve_cipher(&args.profile)?;
    let backend = GpgBackend::new()
        .with_program(&args.gpg)
        .with_armor(args.armor);
    let mut session =
        CipherSession::new(profile, settings, backend).with_progress_every(ctx.progress_every());

    let request = request(args);
    let (label, report) = if encrypt {
        ("pgp encrypt", session.encrypt(request)?)
    } else {
        ("pgp decrypt", session.decrypt(request)?)
    };
    Ok(print_report(label, &report))
}

fn request(args: CipherArgs) -> CipherRequest {
    let suppress = args.selectors.suppress_override();
    let mut request = CipherRequest::new()
        .files(args.selectors.files)
        .cleanup(!args.no_archive)
        .write_log(args.selectors.log);
    if let Some(suppress) = suppress {
        request = request.suppress(suppress);
    }
    if let Some(dir) = args.dir {
        request = request.dir(dir);
    }
    request
}
