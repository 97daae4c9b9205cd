#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    SYST,
    FEAT,
    NOOP,
    PWD,
    CWD,
    CDUP,
    MKD,
    RMD,
    DELE,
    RNFR,
    RNTO,
    SIZE,
    TYPE,
    REST,
    PORT,
    PASV,
    RETR,
    STOR,
    APPE,
    LIST,
    NLST,
    // Recognized verbs this daemon deliberately does not serve; they get a
    // 502 instead of the 500 an unknown verb gets.
    ABOR,
    ACCT,
    ALLO,
    HELP,
    MODE,
    REIN,
    SITE,
    SMNT,
    STAT,
    STOU,
    STRU,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" => Some(FtpCommand::QUIT),
            "SYST" => Some(FtpCommand::SYST),
            "FEAT" => Some(FtpCommand::FEAT),
            "NOOP" => Some(FtpCommand::NOOP),
            "PWD" | "XPWD" => Some(FtpCommand::PWD),
            "CWD" | "XCWD" => Some(FtpCommand::CWD),
            "CDUP" | "XCUP" => Some(FtpCommand::CDUP),
            "MKD" | "XMKD" => Some(FtpCommand::MKD),
            "RMD" | "XRMD" => Some(FtpCommand::RMD),
            "DELE" => Some(FtpCommand::DELE),
            "RNFR" => Some(FtpCommand::RNFR),
            "RNTO" => Some(FtpCommand::RNTO),
            "SIZE" => Some(FtpCommand::SIZE),
            "TYPE" => Some(FtpCommand::TYPE),
            "REST" => Some(FtpCommand::REST),
            "PORT" => Some(FtpCommand::PORT),
            "PASV" => Some(FtpCommand::PASV),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "APPE" => Some(FtpCommand::APPE),
            "LIST" => Some(FtpCommand::LIST),
            "NLST" => Some(FtpCommand::NLST),
            "ABOR" => Some(FtpCommand::ABOR),
            "ACCT" => Some(FtpCommand::ACCT),
            "ALLO" => Some(FtpCommand::ALLO),
            "HELP" => Some(FtpCommand::HELP),
            "MODE" => Some(FtpCommand::MODE),
            "REIN" => Some(FtpCommand::REIN),
            "SITE" => Some(FtpCommand::SITE),
            "SMNT" => Some(FtpCommand::SMNT),
            "STAT" => Some(FtpCommand::STAT),
            "STOU" => Some(FtpCommand::STOU),
            "STRU" => Some(FtpCommand::STRU),
            _ => None,
        }
    }

    /// The few verbs a client may issue before logging in.
    pub fn allowed_before_login(&self) -> bool {
        matches!(
            self,
            FtpCommand::USER
                | FtpCommand::PASS
                | FtpCommand::QUIT
                | FtpCommand::FEAT
                | FtpCommand::SYST
                | FtpCommand::NOOP
        )
    }
}
