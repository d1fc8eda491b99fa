use crate::config::ServerConfig;
use crate::core_auth::UserDirectory;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_network::pasv;
use crate::helpers::ControlWriter;
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core_ftpcommand::{
    cdup, cwd, dele, feat, list, mkd, noop, opts, pass, pwd, quit, retr, rmd, stor, syst, type_,
    user,
};

/// What the control loop should do after a command completes.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionFlow {
    Continue,
    Quit,
}

/// Routes one parsed command to its handler.
///
/// The login gate runs first: before authentication only the handshake
/// commands go through, everything else is answered with a `530` reply
/// signal. After any data-transferring command the passive listener is
/// closed unconditionally, so a failed LIST/RETR/STOR can never leak a
/// pooled port into the next command.
pub async fn dispatch_command(
    cmd: FtpCommand,
    arg: String,
    writer: &ControlWriter,
    config: &Arc<ServerConfig>,
    users: &Arc<UserDirectory>,
    session: &Arc<Mutex<Session>>,
) -> Result<SessionFlow, CommandError> {
    if cmd.requires_login() && !session.lock().await.logged_in {
        return Err(CommandError::reply("530 Please login with USER and PASS"));
    }

    let is_data_command = matches!(
        cmd,
        FtpCommand::LIST | FtpCommand::RETR | FtpCommand::STOR
    );

    let result = match cmd {
        FtpCommand::USER => {
            user::handle_user_command(writer.clone(), Arc::clone(users), Arc::clone(session), arg)
                .await
        }
        FtpCommand::PASS => {
            pass::handle_pass_command(
                writer.clone(),
                Arc::clone(config),
                Arc::clone(users),
                Arc::clone(session),
                arg,
            )
            .await
        }
        FtpCommand::QUIT => {
            quit::handle_quit_command(writer.clone()).await?;
            return Ok(SessionFlow::Quit);
        }
        FtpCommand::PWD => {
            pwd::handle_pwd_command(writer.clone(), Arc::clone(session), arg).await
        }
        FtpCommand::CWD => {
            cwd::handle_cwd_command(writer.clone(), Arc::clone(session), arg).await
        }
        FtpCommand::CDUP => {
            cdup::handle_cdup_command(writer.clone(), Arc::clone(session), arg).await
        }
        FtpCommand::PASV => {
            pasv::handle_pasv_command(writer.clone(), Arc::clone(session), arg).await
        }
        FtpCommand::LIST => {
            list::handle_list_command(writer.clone(), Arc::clone(session), arg).await
        }
        FtpCommand::RETR => {
            retr::handle_retr_command(writer.clone(), Arc::clone(session), arg).await
        }
        FtpCommand::STOR => {
            stor::handle_stor_command(writer.clone(), Arc::clone(session), arg).await
        }
        FtpCommand::DELE => {
            dele::handle_dele_command(writer.clone(), Arc::clone(session), arg).await
        }
        FtpCommand::MKD => {
            mkd::handle_mkd_command(writer.clone(), Arc::clone(session), arg).await
        }
        FtpCommand::RMD => {
            rmd::handle_rmd_command(writer.clone(), Arc::clone(session), arg).await
        }
        FtpCommand::NOOP => noop::handle_noop_command(writer.clone()).await,
        FtpCommand::OPTS => opts::handle_opts_command(writer.clone(), arg).await,
        FtpCommand::SYST => syst::handle_syst_command(writer.clone()).await,
        FtpCommand::TYPE => type_::handle_type_command(writer.clone(), arg).await,
        FtpCommand::FEAT => feat::handle_feat_command(writer.clone()).await,
    };

    if is_data_command {
        session.lock().await.close_pasv();
    }

    result.map(|()| SessionFlow::Continue)
}
