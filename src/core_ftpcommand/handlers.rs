use crate::config::Config;
use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::helpers::ControlWriter;
use crate::session::Session;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;

// Specific modules for PORT and PASV commands
use crate::core_network::pasv;
use crate::core_network::port;

pub type CommandHandler = Box<
    dyn Fn(
            ControlWriter,
            Arc<Config>,
            Arc<TokioMutex<Session>>,
            String, // Argument part of the command line
        ) -> Pin<Box<dyn Future<Output = Result<(), std::io::Error>> + Send>>
        + Send
        + Sync,
>;

/// Builds the dispatch table. An entry holding `None` is a verb this daemon
/// recognizes but answers with 502.
pub fn initialize_command_handlers() -> HashMap<FtpCommand, Option<Arc<CommandHandler>>> {
    let mut handlers: HashMap<FtpCommand, Option<Arc<CommandHandler>>> = HashMap::new();

    handlers.insert(
        FtpCommand::USER,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::user::handle_user_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::PASS,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::pass::handle_pass_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::QUIT,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::quit::handle_quit_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::SYST,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::syst::handle_syst_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::FEAT,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::feat::handle_feat_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::NOOP,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::noop::handle_noop_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::PWD,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::pwd::handle_pwd_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::CWD,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::cwd::handle_cwd_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::CDUP,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::cdup::handle_cdup_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::MKD,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::mkd::handle_mkd_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::RMD,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::rmd::handle_rmd_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::DELE,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::dele::handle_dele_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::RNFR,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::rnfr::handle_rnfr_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::RNTO,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::rnto::handle_rnto_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::SIZE,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::size::handle_size_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::TYPE,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::type_::handle_type_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::REST,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::rest::handle_rest_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::PORT,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(port::handle_port_command(writer, config, session, arg))
        }))),
    );

    handlers.insert(
        FtpCommand::PASV,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(pasv::handle_pasv_command(writer, config, session, arg))
        }))),
    );

    handlers.insert(
        FtpCommand::RETR,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::retr::handle_retr_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::STOR,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::stor::handle_stor_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::APPE,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::appe::handle_appe_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::LIST,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::list::handle_list_command(
                writer, config, session, arg,
            ))
        }))),
    );

    handlers.insert(
        FtpCommand::NLST,
        Some(Arc::new(Box::new(|writer, config, session, arg| {
            Box::pin(crate::core_ftpcommand::list::handle_nlst_command(
                writer, config, session, arg,
            ))
        }))),
    );

    // Recognized but unserved verbs.
    handlers.insert(FtpCommand::ABOR, None);
    handlers.insert(FtpCommand::ACCT, None);
    handlers.insert(FtpCommand::ALLO, None);
    handlers.insert(FtpCommand::HELP, None);
    handlers.insert(FtpCommand::MODE, None);
    handlers.insert(FtpCommand::REIN, None);
    handlers.insert(FtpCommand::SITE, None);
    handlers.insert(FtpCommand::SMNT, None);
    handlers.insert(FtpCommand::STAT, None);
    handlers.insert(FtpCommand::STOU, None);
    handlers.insert(FtpCommand::STRU, None);

    handlers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_recognized_verb_has_a_table_entry() {
        let handlers = initialize_command_handlers();
        for verb in [
            "USER", "PASS", "QUIT", "SYST", "FEAT", "NOOP", "PWD", "CWD", "CDUP", "MKD", "RMD",
            "DELE", "RNFR", "RNTO", "SIZE", "TYPE", "REST", "PORT", "PASV", "RETR", "STOR",
            "APPE", "LIST", "NLST", "ABOR", "ACCT", "ALLO", "HELP", "MODE", "REIN", "SITE",
            "SMNT", "STAT", "STOU", "STRU",
        ] {
            let command = FtpCommand::from_str(verb).unwrap();
            assert!(
                handlers.contains_key(&command),
                "no table entry for {}",
                verb
            );
        }
    }

    #[test]
    fn unserved_verbs_have_empty_entries() {
        let handlers = initialize_command_handlers();
        assert!(handlers.get(&FtpCommand::ABOR).unwrap().is_none());
        assert!(handlers.get(&FtpCommand::SITE).unwrap().is_none());
        assert!(handlers.get(&FtpCommand::RETR).unwrap().is_some());
    }
}
