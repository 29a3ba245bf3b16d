//! IRC numeric reply codes.
//!
//! [`Response`] names every numeric the dispatcher classifies specifically.
//! Codes in 001–999 without a variant here are not dropped: the dispatcher's
//! default arm turns them into `[NNN]`-prefixed raw records.
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol
//! - Modern IRC documentation: <https://modern.ircdocs.horse/>

#![allow(non_camel_case_types)]

use std::str::FromStr;

use crate::record::RawCategory;

/// IRC server response code.
///
/// Categorized as:
/// - 001-099: connection/registration
/// - 200-399: command replies
/// - 400-599: error replies
/// - 600-999: extended/modern numerics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    // === Connection Registration (001-099) ===
    /// 001 - Welcome to the IRC network
    RPL_WELCOME = 1,
    /// 002 - Your host is running version
    RPL_YOURHOST = 2,
    /// 003 - Server creation date
    RPL_CREATED = 3,
    /// 004 - Server info (name, version, user modes, channel modes)
    RPL_MYINFO = 4,
    /// 005 - Server supported features (ISUPPORT)
    RPL_ISUPPORT = 5,
    /// 010 - Bounce to another server
    RPL_BOUNCE = 10,
    /// 042 - Your unique ID
    RPL_YOURID = 42,

    // === Trace (200-210) ===
    /// 200 - Trace link
    RPL_TRACELINK = 200,
    /// 201 - Trace connecting
    RPL_TRACECONNECTING = 201,
    /// 202 - Trace handshake
    RPL_TRACEHANDSHAKE = 202,
    /// 203 - Trace unknown
    RPL_TRACEUNKNOWN = 203,
    /// 204 - Trace operator
    RPL_TRACEOPERATOR = 204,
    /// 205 - Trace user
    RPL_TRACEUSER = 205,
    /// 206 - Trace server
    RPL_TRACESERVER = 206,
    /// 207 - Trace service
    RPL_TRACESERVICE = 207,
    /// 208 - Trace new type
    RPL_TRACENEWTYPE = 208,
    /// 209 - Trace class
    RPL_TRACECLASS = 209,
    /// 210 - Trace reconnect
    RPL_TRACERECONNECT = 210,

    // === Stats (211-249) ===
    /// 211 - Stats link info
    RPL_STATSLINKINFO = 211,
    /// 212 - Stats commands
    RPL_STATSCOMMANDS = 212,
    /// 219 - End of stats
    RPL_ENDOFSTATS = 219,
    /// 221 - User mode string
    RPL_UMODEIS = 221,
    /// 234 - Service list
    RPL_SERVLIST = 234,
    /// 235 - Service list end
    RPL_SERVLISTEND = 235,
    /// 242 - Stats uptime
    RPL_STATSUPTIME = 242,
    /// 243 - Stats O-line
    RPL_STATSOLINE = 243,

    // === Luser (251-266) ===
    /// 251 - Luser client count
    RPL_LUSERCLIENT = 251,
    /// 252 - Luser operator count
    RPL_LUSEROP = 252,
    /// 253 - Luser unknown connections
    RPL_LUSERUNKNOWN = 253,
    /// 254 - Luser channel count
    RPL_LUSERCHANNELS = 254,
    /// 255 - Luser local info
    RPL_LUSERME = 255,

    // === Admin (256-259) ===
    /// 256 - Admin info start
    RPL_ADMINME = 256,
    /// 257 - Admin location 1
    RPL_ADMINLOC1 = 257,
    /// 258 - Admin location 2
    RPL_ADMINLOC2 = 258,
    /// 259 - Admin email
    RPL_ADMINEMAIL = 259,

    /// 261 - Trace log
    RPL_TRACELOG = 261,
    /// 262 - Trace end
    RPL_TRACEEND = 262,
    /// 263 - Try again later
    RPL_TRYAGAIN = 263,
    /// 265 - Local users
    RPL_LOCALUSERS = 265,
    /// 266 - Global users
    RPL_GLOBALUSERS = 266,

    /// 271 - Silence list entry
    RPL_SILELIST = 271,
    /// 272 - End of silence list
    RPL_ENDOFSILELIST = 272,
    /// 276 - WHOIS certificate fingerprint
    RPL_WHOISCERTFP = 276,

    // === User queries (301-306) ===
    /// 301 - User is away
    RPL_AWAY = 301,
    /// 302 - USERHOST reply
    RPL_USERHOST = 302,
    /// 303 - ISON reply
    RPL_ISON = 303,
    /// 305 - You are no longer marked as away
    RPL_UNAWAY = 305,
    /// 306 - You have been marked as away
    RPL_NOWAWAY = 306,

    // === WHOIS/WHOWAS (307-320) ===
    /// 307 - WHOIS registered nick
    RPL_WHOISREGNICK = 307,
    /// 311 - WHOIS user info
    RPL_WHOISUSER = 311,
    /// 312 - WHOIS server
    RPL_WHOISSERVER = 312,
    /// 313 - WHOIS operator status
    RPL_WHOISOPERATOR = 313,
    /// 314 - WHOWAS user info
    RPL_WHOWASUSER = 314,
    /// 315 - End of WHO
    RPL_ENDOFWHO = 315,
    /// 317 - WHOIS idle time
    RPL_WHOISIDLE = 317,
    /// 318 - End of WHOIS
    RPL_ENDOFWHOIS = 318,
    /// 319 - WHOIS channels
    RPL_WHOISCHANNELS = 319,
    /// 320 - WHOIS special note
    RPL_WHOISSPECIAL = 320,

    // === Channel/list replies (321-349) ===
    /// 321 - List start
    RPL_LISTSTART = 321,
    /// 322 - List entry
    RPL_LIST = 322,
    /// 323 - List end
    RPL_LISTEND = 323,
    /// 324 - Channel mode
    RPL_CHANNELMODEIS = 324,
    /// 329 - Channel creation time
    RPL_CREATIONTIME = 329,
    /// 330 - WHOIS account name
    RPL_WHOISACCOUNT = 330,
    /// 331 - No topic set
    RPL_NOTOPIC = 331,
    /// 332 - Channel topic
    RPL_TOPIC = 332,
    /// 333 - Topic set by/time
    RPL_TOPICWHOTIME = 333,
    /// 335 - WHOIS bot flag
    RPL_WHOISBOT = 335,
    /// 338 - WHOIS actually (real host)
    RPL_WHOISACTUALLY = 338,
    /// 341 - Inviting user to channel
    RPL_INVITING = 341,
    /// 346 - Invite list entry
    RPL_INVITELIST = 346,
    /// 347 - End of invite list
    RPL_ENDOFINVITELIST = 347,
    /// 348 - Exception list entry
    RPL_EXCEPTLIST = 348,
    /// 349 - End of exception list
    RPL_ENDOFEXCEPTLIST = 349,

    // === Server queries (351-354) ===
    /// 351 - Server version
    RPL_VERSION = 351,
    /// 352 - WHO reply
    RPL_WHOREPLY = 352,
    /// 353 - NAMES reply
    RPL_NAMREPLY = 353,
    /// 354 - WHOX reply
    RPL_WHOSPCRPL = 354,

    // === Links/names/lists end (364-369) ===
    /// 364 - Links entry
    RPL_LINKS = 364,
    /// 365 - End of links
    RPL_ENDOFLINKS = 365,
    /// 366 - End of NAMES
    RPL_ENDOFNAMES = 366,
    /// 367 - Ban list entry
    RPL_BANLIST = 367,
    /// 368 - End of ban list
    RPL_ENDOFBANLIST = 368,
    /// 369 - End of WHOWAS
    RPL_ENDOFWHOWAS = 369,

    // === Info/MOTD (371-396) ===
    /// 371 - Info text
    RPL_INFO = 371,
    /// 372 - MOTD text
    RPL_MOTD = 372,
    /// 374 - End of info
    RPL_ENDOFINFO = 374,
    /// 375 - MOTD start
    RPL_MOTDSTART = 375,
    /// 376 - End of MOTD
    RPL_ENDOFMOTD = 376,
    /// 378 - WHOIS host
    RPL_WHOISHOST = 378,
    /// 379 - WHOIS modes
    RPL_WHOISMODES = 379,
    /// 381 - You are now an operator
    RPL_YOUREOPER = 381,
    /// 382 - Rehashing config
    RPL_REHASHING = 382,
    /// 391 - Server time
    RPL_TIME = 391,
    /// 396 - Host hidden
    RPL_HOSTHIDDEN = 396,

    // === Error Replies (400-599) ===
    /// 400 - Unknown error
    ERR_UNKNOWNERROR = 400,
    /// 401 - No such nick
    ERR_NOSUCHNICK = 401,
    /// 402 - No such server
    ERR_NOSUCHSERVER = 402,
    /// 403 - No such channel
    ERR_NOSUCHCHANNEL = 403,
    /// 404 - Cannot send to channel
    ERR_CANNOTSENDTOCHAN = 404,
    /// 405 - Too many channels
    ERR_TOOMANYCHANNELS = 405,
    /// 406 - Was no such nick
    ERR_WASNOSUCHNICK = 406,
    /// 407 - Too many targets
    ERR_TOOMANYTARGETS = 407,
    /// 409 - No origin
    ERR_NOORIGIN = 409,
    /// 410 - Invalid CAP command
    ERR_INVALIDCAPCMD = 410,
    /// 411 - No recipient
    ERR_NORECIPIENT = 411,
    /// 412 - No text to send
    ERR_NOTEXTTOSEND = 412,
    /// 417 - Input too long
    ERR_INPUTTOOLONG = 417,
    /// 421 - Unknown command
    ERR_UNKNOWNCOMMAND = 421,
    /// 422 - No MOTD
    ERR_NOMOTD = 422,
    /// 431 - No nickname given
    ERR_NONICKNAMEGIVEN = 431,
    /// 432 - Erroneous nickname
    ERR_ERRONEOUSNICKNAME = 432,
    /// 433 - Nickname in use
    ERR_NICKNAMEINUSE = 433,
    /// 436 - Nick collision
    ERR_NICKCOLLISION = 436,
    /// 437 - Resource unavailable
    ERR_UNAVAILRESOURCE = 437,
    /// 441 - User not in channel
    ERR_USERNOTINCHANNEL = 441,
    /// 442 - Not on channel
    ERR_NOTONCHANNEL = 442,
    /// 443 - User on channel
    ERR_USERONCHANNEL = 443,
    /// 451 - Not registered
    ERR_NOTREGISTERED = 451,
    /// 461 - Need more params
    ERR_NEEDMOREPARAMS = 461,
    /// 462 - Already registered
    ERR_ALREADYREGISTERED = 462,
    /// 464 - Password mismatch
    ERR_PASSWDMISMATCH = 464,
    /// 465 - You are banned
    ERR_YOUREBANNEDCREEP = 465,
    /// 471 - Channel is full
    ERR_CHANNELISFULL = 471,
    /// 472 - Unknown mode
    ERR_UNKNOWNMODE = 472,
    /// 473 - Invite only channel
    ERR_INVITEONLYCHAN = 473,
    /// 474 - Banned from channel
    ERR_BANNEDFROMCHAN = 474,
    /// 475 - Bad channel key
    ERR_BADCHANNELKEY = 475,
    /// 476 - Bad channel mask
    ERR_BADCHANMASK = 476,
    /// 478 - Ban list full
    ERR_BANLISTFULL = 478,
    /// 481 - No privileges
    ERR_NOPRIVILEGES = 481,
    /// 482 - Channel op privileges needed
    ERR_CHANOPRIVSNEEDED = 482,
    /// 483 - Cannot kill server
    ERR_CANTKILLSERVER = 483,
    /// 484 - Restricted
    ERR_RESTRICTED = 484,
    /// 491 - No oper host
    ERR_NOOPERHOST = 491,
    /// 501 - Unknown mode flag
    ERR_UMODEUNKNOWNFLAG = 501,
    /// 502 - Users don't match
    ERR_USERSDONTMATCH = 502,
    /// 524 - Help not found
    ERR_HELPNOTFOUND = 524,
    /// 525 - Invalid channel key
    ERR_INVALIDKEY = 525,
    /// 531 - Cannot send to user
    ERR_CANTSENDTOUSER = 531,

    // === WATCH (600-608) ===
    /// 600 - Watched user logged on
    RPL_LOGON = 600,
    /// 601 - Watched user logged off
    RPL_LOGOFF = 601,
    /// 602 - Stopped watching
    RPL_WATCHOFF = 602,
    /// 603 - Watch status
    RPL_WATCHSTAT = 603,
    /// 604 - Watched user is online
    RPL_NOWON = 604,
    /// 605 - Watched user is offline
    RPL_NOWOFF = 605,
    /// 606 - Watch list entry
    RPL_WATCHLIST = 606,
    /// 607 - End of watch list
    RPL_ENDOFWATCHLIST = 607,
    /// 608 - Watch list cleared
    RPL_CLEARWATCH = 608,

    // === STARTTLS / extended (670-706) ===
    /// 670 - STARTTLS successful
    RPL_STARTTLS = 670,
    /// 671 - WHOIS secure connection
    RPL_WHOISSECURE = 671,
    /// 691 - STARTTLS failed
    ERR_STARTTLS = 691,
    /// 696 - Invalid mode parameter
    ERR_INVALIDMODEPARAM = 696,
    /// 704 - Help start
    RPL_HELPSTART = 704,
    /// 705 - Help text
    RPL_HELPTXT = 705,
    /// 706 - End of help
    RPL_ENDOFHELP = 706,
    /// 723 - No privileges
    ERR_NOPRIVS = 723,

    // === Quiet list (728-729) ===
    /// 728 - Quiet list entry
    RPL_QUIETLIST = 728,
    /// 729 - End of quiet list
    RPL_ENDOFQUIETLIST = 729,

    // === Monitor (730-734) ===
    /// 730 - Monitor online
    RPL_MONONLINE = 730,
    /// 731 - Monitor offline
    RPL_MONOFFLINE = 731,
    /// 732 - Monitor list
    RPL_MONLIST = 732,
    /// 733 - End of monitor list
    RPL_ENDOFMONLIST = 733,
    /// 734 - Monitor list full
    ERR_MONLISTFULL = 734,

    // === Metadata (760-762) ===
    /// 760 - WHOIS key/value
    RPL_WHOISKEYVALUE = 760,
    /// 761 - Key/value
    RPL_KEYVALUE = 761,
    /// 762 - End of metadata
    RPL_METADATAEND = 762,

    // === SASL (900-908) ===
    /// 900 - Logged in
    RPL_LOGGEDIN = 900,
    /// 901 - Logged out
    RPL_LOGGEDOUT = 901,
    /// 902 - Nick locked
    ERR_NICKLOCKED = 902,
    /// 903 - SASL success
    RPL_SASLSUCCESS = 903,
    /// 904 - SASL fail
    ERR_SASLFAIL = 904,
    /// 905 - SASL too long
    ERR_SASLTOOLONG = 905,
    /// 906 - SASL aborted
    ERR_SASLABORT = 906,
    /// 907 - SASL already authenticated
    ERR_SASLALREADY = 907,
    /// 908 - SASL mechanisms
    RPL_SASLMECHS = 908,
}

impl Response {
    /// Returns the numeric code as u16.
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Creates a Response from a numeric code.
    pub fn from_code(code: u16) -> Option<Response> {
        use Response::*;
        Some(match code {
            1 => RPL_WELCOME,
            2 => RPL_YOURHOST,
            3 => RPL_CREATED,
            4 => RPL_MYINFO,
            5 => RPL_ISUPPORT,
            10 => RPL_BOUNCE,
            42 => RPL_YOURID,
            200 => RPL_TRACELINK,
            201 => RPL_TRACECONNECTING,
            202 => RPL_TRACEHANDSHAKE,
            203 => RPL_TRACEUNKNOWN,
            204 => RPL_TRACEOPERATOR,
            205 => RPL_TRACEUSER,
            206 => RPL_TRACESERVER,
            207 => RPL_TRACESERVICE,
            208 => RPL_TRACENEWTYPE,
            209 => RPL_TRACECLASS,
            210 => RPL_TRACERECONNECT,
            211 => RPL_STATSLINKINFO,
            212 => RPL_STATSCOMMANDS,
            219 => RPL_ENDOFSTATS,
            221 => RPL_UMODEIS,
            234 => RPL_SERVLIST,
            235 => RPL_SERVLISTEND,
            242 => RPL_STATSUPTIME,
            243 => RPL_STATSOLINE,
            251 => RPL_LUSERCLIENT,
            252 => RPL_LUSEROP,
            253 => RPL_LUSERUNKNOWN,
            254 => RPL_LUSERCHANNELS,
            255 => RPL_LUSERME,
            256 => RPL_ADMINME,
            257 => RPL_ADMINLOC1,
            258 => RPL_ADMINLOC2,
            259 => RPL_ADMINEMAIL,
            261 => RPL_TRACELOG,
            262 => RPL_TRACEEND,
            263 => RPL_TRYAGAIN,
            265 => RPL_LOCALUSERS,
            266 => RPL_GLOBALUSERS,
            271 => RPL_SILELIST,
            272 => RPL_ENDOFSILELIST,
            276 => RPL_WHOISCERTFP,
            301 => RPL_AWAY,
            302 => RPL_USERHOST,
            303 => RPL_ISON,
            305 => RPL_UNAWAY,
            306 => RPL_NOWAWAY,
            307 => RPL_WHOISREGNICK,
            311 => RPL_WHOISUSER,
            312 => RPL_WHOISSERVER,
            313 => RPL_WHOISOPERATOR,
            314 => RPL_WHOWASUSER,
            315 => RPL_ENDOFWHO,
            317 => RPL_WHOISIDLE,
            318 => RPL_ENDOFWHOIS,
            319 => RPL_WHOISCHANNELS,
            320 => RPL_WHOISSPECIAL,
            321 => RPL_LISTSTART,
            322 => RPL_LIST,
            323 => RPL_LISTEND,
            324 => RPL_CHANNELMODEIS,
            329 => RPL_CREATIONTIME,
            330 => RPL_WHOISACCOUNT,
            331 => RPL_NOTOPIC,
            332 => RPL_TOPIC,
            333 => RPL_TOPICWHOTIME,
            335 => RPL_WHOISBOT,
            338 => RPL_WHOISACTUALLY,
            341 => RPL_INVITING,
            346 => RPL_INVITELIST,
            347 => RPL_ENDOFINVITELIST,
            348 => RPL_EXCEPTLIST,
            349 => RPL_ENDOFEXCEPTLIST,
            351 => RPL_VERSION,
            352 => RPL_WHOREPLY,
            353 => RPL_NAMREPLY,
            354 => RPL_WHOSPCRPL,
            364 => RPL_LINKS,
            365 => RPL_ENDOFLINKS,
            366 => RPL_ENDOFNAMES,
            367 => RPL_BANLIST,
            368 => RPL_ENDOFBANLIST,
            369 => RPL_ENDOFWHOWAS,
            371 => RPL_INFO,
            372 => RPL_MOTD,
            374 => RPL_ENDOFINFO,
            375 => RPL_MOTDSTART,
            376 => RPL_ENDOFMOTD,
            378 => RPL_WHOISHOST,
            379 => RPL_WHOISMODES,
            381 => RPL_YOUREOPER,
            382 => RPL_REHASHING,
            391 => RPL_TIME,
            396 => RPL_HOSTHIDDEN,
            400 => ERR_UNKNOWNERROR,
            401 => ERR_NOSUCHNICK,
            402 => ERR_NOSUCHSERVER,
            403 => ERR_NOSUCHCHANNEL,
            404 => ERR_CANNOTSENDTOCHAN,
            405 => ERR_TOOMANYCHANNELS,
            406 => ERR_WASNOSUCHNICK,
            407 => ERR_TOOMANYTARGETS,
            409 => ERR_NOORIGIN,
            410 => ERR_INVALIDCAPCMD,
            411 => ERR_NORECIPIENT,
            412 => ERR_NOTEXTTOSEND,
            417 => ERR_INPUTTOOLONG,
            421 => ERR_UNKNOWNCOMMAND,
            422 => ERR_NOMOTD,
            431 => ERR_NONICKNAMEGIVEN,
            432 => ERR_ERRONEOUSNICKNAME,
            433 => ERR_NICKNAMEINUSE,
            436 => ERR_NICKCOLLISION,
            437 => ERR_UNAVAILRESOURCE,
            441 => ERR_USERNOTINCHANNEL,
            442 => ERR_NOTONCHANNEL,
            443 => ERR_USERONCHANNEL,
            451 => ERR_NOTREGISTERED,
            461 => ERR_NEEDMOREPARAMS,
            462 => ERR_ALREADYREGISTERED,
            464 => ERR_PASSWDMISMATCH,
            465 => ERR_YOUREBANNEDCREEP,
            471 => ERR_CHANNELISFULL,
            472 => ERR_UNKNOWNMODE,
            473 => ERR_INVITEONLYCHAN,
            474 => ERR_BANNEDFROMCHAN,
            475 => ERR_BADCHANNELKEY,
            476 => ERR_BADCHANMASK,
            478 => ERR_BANLISTFULL,
            481 => ERR_NOPRIVILEGES,
            482 => ERR_CHANOPRIVSNEEDED,
            483 => ERR_CANTKILLSERVER,
            484 => ERR_RESTRICTED,
            491 => ERR_NOOPERHOST,
            501 => ERR_UMODEUNKNOWNFLAG,
            502 => ERR_USERSDONTMATCH,
            524 => ERR_HELPNOTFOUND,
            525 => ERR_INVALIDKEY,
            531 => ERR_CANTSENDTOUSER,
            600 => RPL_LOGON,
            601 => RPL_LOGOFF,
            602 => RPL_WATCHOFF,
            603 => RPL_WATCHSTAT,
            604 => RPL_NOWON,
            605 => RPL_NOWOFF,
            606 => RPL_WATCHLIST,
            607 => RPL_ENDOFWATCHLIST,
            608 => RPL_CLEARWATCH,
            670 => RPL_STARTTLS,
            671 => RPL_WHOISSECURE,
            691 => ERR_STARTTLS,
            696 => ERR_INVALIDMODEPARAM,
            704 => RPL_HELPSTART,
            705 => RPL_HELPTXT,
            706 => RPL_ENDOFHELP,
            723 => ERR_NOPRIVS,
            728 => RPL_QUIETLIST,
            729 => RPL_ENDOFQUIETLIST,
            730 => RPL_MONONLINE,
            731 => RPL_MONOFFLINE,
            732 => RPL_MONLIST,
            733 => RPL_ENDOFMONLIST,
            734 => ERR_MONLISTFULL,
            760 => RPL_WHOISKEYVALUE,
            761 => RPL_KEYVALUE,
            762 => RPL_METADATAEND,
            900 => RPL_LOGGEDIN,
            901 => RPL_LOGGEDOUT,
            902 => ERR_NICKLOCKED,
            903 => RPL_SASLSUCCESS,
            904 => ERR_SASLFAIL,
            905 => ERR_SASLTOOLONG,
            906 => ERR_SASLABORT,
            907 => ERR_SASLALREADY,
            908 => RPL_SASLMECHS,
            _ => return None,
        })
    }

    /// Check if this is an error response.
    #[inline]
    pub fn is_error(&self) -> bool {
        let code = self.code();
        (400..600).contains(&code)
            || code == 691
            || code == 696
            || code == 723
            || code == 734
            || code == 902
            || (904..=907).contains(&code)
    }

    /// Check if this is a connection registration response (001-099).
    #[inline]
    pub fn is_registration(&self) -> bool {
        self.code() < 100
    }

    /// Check if this is a SASL-related response (900-908).
    #[inline]
    pub fn is_sasl(&self) -> bool {
        (900..=908).contains(&self.code())
    }

    /// The display-filter category for raw records of this numeric.
    pub fn raw_category(&self) -> RawCategory {
        use Response::*;
        if self.is_sasl() {
            return RawCategory::Auth;
        }
        match self {
            RPL_AWAY | RPL_USERHOST | RPL_ISON | RPL_UNAWAY | RPL_NOWAWAY | RPL_UMODEIS
            | RPL_WHOISCERTFP | RPL_WHOISREGNICK | RPL_WHOISUSER | RPL_WHOISSERVER
            | RPL_WHOISOPERATOR | RPL_WHOWASUSER | RPL_ENDOFWHO | RPL_WHOISIDLE
            | RPL_ENDOFWHOIS | RPL_WHOISCHANNELS | RPL_WHOISSPECIAL | RPL_WHOISACCOUNT
            | RPL_WHOISBOT | RPL_WHOISACTUALLY | RPL_WHOREPLY | RPL_WHOSPCRPL
            | RPL_ENDOFWHOWAS | RPL_WHOISHOST | RPL_WHOISMODES | RPL_WHOISSECURE
            | RPL_HOSTHIDDEN | RPL_LOGON | RPL_LOGOFF | RPL_WATCHOFF | RPL_WATCHSTAT
            | RPL_NOWON | RPL_NOWOFF | RPL_WATCHLIST | RPL_ENDOFWATCHLIST | RPL_CLEARWATCH
            | RPL_MONONLINE | RPL_MONOFFLINE | RPL_MONLIST | RPL_ENDOFMONLIST
            | RPL_WHOISKEYVALUE | RPL_SILELIST | RPL_ENDOFSILELIST => RawCategory::User,
            RPL_LISTSTART | RPL_LIST | RPL_LISTEND | RPL_CHANNELMODEIS | RPL_CREATIONTIME
            | RPL_NOTOPIC | RPL_TOPIC | RPL_TOPICWHOTIME | RPL_INVITING | RPL_INVITELIST
            | RPL_ENDOFINVITELIST | RPL_EXCEPTLIST | RPL_ENDOFEXCEPTLIST | RPL_NAMREPLY
            | RPL_ENDOFNAMES | RPL_BANLIST | RPL_ENDOFBANLIST | RPL_QUIETLIST
            | RPL_ENDOFQUIETLIST => RawCategory::Channel,
            _ => RawCategory::Server,
        }
    }
}

impl FromStr for Response {
    type Err = ParseResponseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: u16 = s.parse().map_err(|_| ParseResponseError::InvalidFormat)?;
        Response::from_code(code).ok_or(ParseResponseError::UnknownCode(code))
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.code())
    }
}

/// Error when parsing a response code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseResponseError {
    /// The string was not a valid number.
    InvalidFormat,
    /// The numeric code has no named variant.
    UnknownCode(u16),
}

impl std::fmt::Display for ParseResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat => write!(f, "invalid response code format"),
            Self::UnknownCode(code) => write!(f, "unknown response code: {}", code),
        }
    }
}

impl std::error::Error for ParseResponseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_code() {
        assert_eq!(Response::RPL_WELCOME.code(), 1);
        assert_eq!(Response::ERR_NICKNAMEINUSE.code(), 433);
        assert_eq!(Response::RPL_ENDOFMOTD.code(), 376);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Response::from_code(1), Some(Response::RPL_WELCOME));
        assert_eq!(Response::from_code(433), Some(Response::ERR_NICKNAMEINUSE));
        assert_eq!(Response::from_code(600), Some(Response::RPL_LOGON));
        assert_eq!(Response::from_code(999), None);
    }

    #[test]
    fn test_from_code_roundtrips() {
        for code in 0..1000u16 {
            if let Some(resp) = Response::from_code(code) {
                assert_eq!(resp.code(), code);
            }
        }
    }

    #[test]
    fn test_is_error() {
        assert!(Response::ERR_NICKNAMEINUSE.is_error());
        assert!(Response::ERR_SASLFAIL.is_error());
        assert!(Response::ERR_STARTTLS.is_error());
        assert!(Response::ERR_MONLISTFULL.is_error());
        assert!(!Response::RPL_WELCOME.is_error());
        assert!(!Response::RPL_SASLSUCCESS.is_error());
        assert!(!Response::RPL_LOGGEDIN.is_error());
    }

    #[test]
    fn test_raw_category() {
        assert_eq!(Response::RPL_MOTD.raw_category(), RawCategory::Server);
        assert_eq!(Response::RPL_WHOISUSER.raw_category(), RawCategory::User);
        assert_eq!(Response::RPL_BANLIST.raw_category(), RawCategory::Channel);
        assert_eq!(Response::RPL_SASLSUCCESS.raw_category(), RawCategory::Auth);
        assert_eq!(Response::RPL_MONONLINE.raw_category(), RawCategory::User);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("001".parse::<Response>().unwrap(), Response::RPL_WELCOME);
        assert_eq!(format!("{}", Response::RPL_WELCOME), "001");
        assert_eq!(format!("{}", Response::ERR_NICKNAMEINUSE), "433");
        assert!("abc".parse::<Response>().is_err());
        assert_eq!(
            "999".parse::<Response>().unwrap_err(),
            ParseResponseError::UnknownCode(999)
        );
    }
}
