// src/constants.rs

// Numeric FTP reply codes (RFC 959 section 4.2).
pub const FTP_DATACONN: u16 = 150;

pub const FTP_NOOPOK: u16 = 200;
pub const FTP_TYPEOK: u16 = 200;
pub const FTP_PORTOK: u16 = 200;
pub const FTP_FEATOK: u16 = 211;
pub const FTP_SIZEOK: u16 = 213;
pub const FTP_SYSTOK: u16 = 215;
pub const FTP_GREET: u16 = 220;
pub const FTP_GOODBYE: u16 = 221;
pub const FTP_TRANSFEROK: u16 = 226;
pub const FTP_PASVOK: u16 = 227;
pub const FTP_LOGINOK: u16 = 230;
pub const FTP_CWDOK: u16 = 250;
pub const FTP_RMDIROK: u16 = 250;
pub const FTP_DELEOK: u16 = 250;
pub const FTP_RENAMEOK: u16 = 250;
pub const FTP_PWDOK: u16 = 257;
pub const FTP_MKDIROK: u16 = 257;

pub const FTP_GIVEPWORD: u16 = 331;
pub const FTP_RESTOK: u16 = 350;
pub const FTP_RNFROK: u16 = 350;

pub const FTP_IDLE_TIMEOUT: u16 = 421;
pub const FTP_BADSENDCONN: u16 = 425;
pub const FTP_BADSENDNET: u16 = 426;
pub const FTP_BADSENDFILE: u16 = 451;

pub const FTP_BADCMD: u16 = 500;
pub const FTP_BADOPTS: u16 = 501;
pub const FTP_COMMANDNOTIMPL: u16 = 502;
pub const FTP_BADSEQ: u16 = 503;
pub const FTP_LOGINERR: u16 = 530;
pub const FTP_FILEFAIL: u16 = 550;
pub const FTP_UPLOADFAIL: u16 = 553;

/// Longest control-channel command line accepted, terminator included.
pub const MAX_COMMAND_LINE: usize = 1024;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/ferrousftpd.conf";
