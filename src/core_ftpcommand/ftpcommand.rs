#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    PWD,
    CWD,
    CDUP,
    PASV,
    LIST,
    RETR,
    STOR,
    DELE,
    MKD,
    RMD,
    NOOP,
    OPTS,
    SYST,
    TYPE,
    FEAT,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" => Some(FtpCommand::QUIT),
            "PWD" => Some(FtpCommand::PWD),
            "CWD" => Some(FtpCommand::CWD),
            "CDUP" => Some(FtpCommand::CDUP),
            "PASV" => Some(FtpCommand::PASV),
            "LIST" => Some(FtpCommand::LIST),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "DELE" => Some(FtpCommand::DELE),
            "MKD" => Some(FtpCommand::MKD),
            "RMD" => Some(FtpCommand::RMD),
            "NOOP" => Some(FtpCommand::NOOP),
            "OPTS" => Some(FtpCommand::OPTS),
            "SYST" => Some(FtpCommand::SYST),
            "TYPE" => Some(FtpCommand::TYPE),
            "FEAT" => Some(FtpCommand::FEAT),
            _ => None,
        }
    }

    /// Commands that may run before authentication. Everything else is
    /// rejected with `530 Please login with USER and PASS`.
    pub fn requires_login(&self) -> bool {
        !matches!(
            self,
            FtpCommand::NOOP
                | FtpCommand::OPTS
                | FtpCommand::SYST
                | FtpCommand::TYPE
                | FtpCommand::FEAT
                | FtpCommand::USER
                | FtpCommand::PASS
                | FtpCommand::QUIT
        )
    }
}
