//! Static field-type catalog.
//!
//! Template descriptors do not carry their field's data type; the flag
//! bytes and length narrow it down but cannot distinguish, say, a packed
//! time from a plain 4-byte counter. The catalog below records the
//! documented type of every template field per profile class, from the
//! z/OS 2.4 template definitions:
//!
//! - <https://www.ibm.com/docs/en/zos/2.4.0?topic=definitions-group-template-racf-database>
//! - <https://www.ibm.com/docs/en/zos/2.4.0?topic=definitions-user-template-racf-database>
//! - <https://www.ibm.com/docs/en/zos/2.4.0?topic=definitions-connect-template-racf-database>
//! - <https://www.ibm.com/docs/en/zos/2.4.0?topic=definitions-data-set-template-racf-database>
//! - <https://www.ibm.com/docs/en/zos/2.4.0?topic=definitions-general-template-racf-database>
//!
//! Fields absent from the catalog (and every field when the catalog is
//! disabled) fall back to the flag-byte heuristic in [`crate::schema`].
//! Combination fields are not listed.

/// Documented data type of a template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogType {
    /// Unsigned integer of the descriptor's declared width.
    Int,
    /// EBCDIC character data (hex when the field is encrypted).
    Char,
    /// Packed BCD date.
    Date,
    /// Packed 4-byte time.
    Time,
    /// Binary data (a flag byte when the descriptor says so, hex otherwise).
    Bin,
    /// Flag byte(s).
    Flag,
}

/// Look up the documented type of `field` in `class`'s template.
pub fn lookup(class: &str, field: &str) -> Option<CatalogType> {
    match class {
        "GROUP" => group_field(field),
        "USER" => user_field(field),
        "CONNECT" => connect_field(field),
        "DATASET" => dataset_field(field),
        "GENERAL" => general_field(field),
        _ => None,
    }
}

fn group_field(name: &str) -> Option<CatalogType> {
    use CatalogType::*;
    Some(match name {
        "ENTYPE" | "VERSION" | "INITCNT" | "FLDCNT" | "SUBGRPCT" | "ACLCNT" | "USRCNT"
        | "GID" | "ROLEN" | "CSCNT" => Int,
        "SUPGROUP" | "AUTHOR" | "INSTDATA" | "MODELNAM" | "FLDNAME" | "SUBGRPNM" | "USERID"
        | "USRNM" | "DATAAPPL" | "DATACLAS" | "MGMTCLAS" | "STORCLAS" | "ROLES" | "CSKEY"
        | "CSVALUE" => Char,
        "AUTHDATE" => Date,
        "UACC" | "NOTRMUAC" | "FLDFLAG" | "USERACS" | "USRFLG" | "CSTYPE" => Flag,
        "FLDVALUE" | "USRDATA" | "UNVFLG" => Bin,
        _ => return None,
    })
}

fn user_field(name: &str) -> Option<CatalogType> {
    use CatalogType::*;
    Some(match name {
        "ENTYPE" | "VERSION" | "PASSINT" | "PWDGEN" | "PWDCNT" | "OLDPWDNM" | "REVOKECT"
        | "SECLEVEL" | "NUMCTGY" | "CATEGORY" | "FLDCNT" | "CLCNT" | "CONGRPCT" | "USRCNT"
        | "CGGRPCT" | "CGINITCT" | "TUCNT" | "CERTCT" | "NMAPCT" | "PHRGEN" | "PHRCNT"
        | "OLDPHRNM" | "CERTSEQN" | "DMAPCT" | "OPWDXCT" | "OPWDXGEN" | "PHRCNTX"
        | "OLDPHRNX" | "FACTORN" | "MFAPOLN" | "TLSIZE" | "TMSIZE" | "TPERFORM" | "OPCLASSN"
        | "OPCLASS" | "OPPRTY" | "RSLKEYN" | "RSLKEY" | "TSLKEYN" | "TSLKEY" | "OPERMCNT"
        | "UID" | "CPUTIME" | "ASSIZE" | "FILEPROC" | "PROCUSER" | "THREADS" | "MMAPAREA"
        | "DOMAINSN" | "CSCNT" => Int,
        "AUTHOR" | "PGMRNAME" | "DFLTGRP" | "INSTDATA" | "OLDPWD" | "MODELNAM" | "FLDNAME"
        | "CLNAME" | "CONGRPNM" | "USRNM" | "SECLABEL" | "CGGRPNM" | "CGAUTHOR" | "TUKEY"
        | "CERTNAME" | "CERTLABL" | "CERTSJDN" | "NMAPLABL" | "NMAPNAME" | "NMAPRSV1"
        | "NMAPRSV2" | "NMAPRSV3" | "NMAPRSV4" | "NMAPRSV5" | "DMAPLABL" | "DMAPNAME"
        | "DMAPRSV1" | "DMAPRSV2" | "FACTOR" | "FACACDT" | "MFAPOLNM" | "DATAAPPL"
        | "DATACLAS" | "MGMTCLAS" | "STORCLAS" | "TACCNT" | "TCOMMAND" | "TDEST" | "THCLASS"
        | "TJCLASS" | "TLPROC" | "TMCLASS" | "TSCLASS" | "TUNIT" | "TSOSLABL" | "TCONS"
        | "OPIDENT" | "USERNL1" | "USERNL2" | "OPERMSCP" | "WANAME" | "WABLDG" | "WADEPT"
        | "WAROOM" | "WAADDR1" | "WAADDR2" | "WAADDR3" | "WAADDR4" | "WAACCNT" | "WAEMAIL"
        | "HOME" | "PROGRAM" | "MEMLIMIT" | "SHMEMMAX" | "IC" | "CONSNAME" | "DOMAINS"
        | "UUID" | "DCENAME" | "HOMECELL" | "HOMEUUID" | "DPASSWDS" | "FSROOT" | "SNAME"
        | "UNAME" | "KERBNAME" | "MINTKTLF" | "MAXTKTLF" | "DEFTKTLF" | "SALT" | "ENCTYPE"
        | "CURKEYV" | "CURKEY" | "PREVKEYV" | "PREVKEY" | "KEYFROM" | "LDAPHOST" | "BINDDN"
        | "BINDPW" | "BINDPWKY" | "LDAPPROF" | "CSKEY" | "CSVALUE" => Char,
        "AUTHDATE" | "PASSDATE" | "LJDATE" | "REVOKEDT" | "RESUMEDT" | "CGAUTHDA"
        | "CGLJDATE" | "CGREVKDT" | "CGRESMDT" | "PHRDATE" => Date,
        "LJTIME" | "LOGTIME" | "CGLJTIME" => Time,
        "FLAG1" | "FLAG2" | "FLAG3" | "FLAG4" | "FLAG5" | "FLAG6" | "FLAG7" | "FLAG8"
        | "FLAG9" | "UAUDIT" | "LOGDAYS" | "FLDFLAG" | "USRFLG" | "CGFLAG1" | "CGFLAG2"
        | "CGFLAG3" | "CGFLAG4" | "CGFLAG5" | "CGNOTUAC" | "CGGRPAUD" | "PASSASIS"
        | "FLAGROA" | "XRFSOFF" | "CTL" | "MSGRECVR" | "NGMFADMN" | "DCEFLAGS" | "OPERAUTH"
        | "OPERMFRM" | "OPERLEVL" | "OPERMON" | "OPERROUT" | "OPERLOGC" | "OPERMGID"
        | "OPERDOM" | "OPERUD" | "OPERALTG" | "OPERAUTO" | "OPERHC" | "OPERINT"
        | "OPERUNKN" => Flag,
        "PASSWORD" | "MAGSTRIP" | "FLDVALUE" | "USRDATA" | "CGUACC" | "TUDATA" | "CERTPUBK"
        | "CERTRSV3" | "PWDENV" | "PHRASE" | "OLDPHR" | "PPHENV" | "PWDX" | "OPWDX"
        | "PHRASEX" | "OLDPHRX" | "MFAFLBK" | "FACTAGS" | "TOPTION" | "TRBA" | "TUPT"
        | "TIMEOUT" | "OPERSTOR" | "OPERKEY" | "OPERCMDS" | "NGMFVSPN" | "DCEENCRY"
        | "ENCRYPT" => Bin,
        _ => return None,
    })
}

fn connect_field(name: &str) -> Option<CatalogType> {
    use CatalogType::*;
    Some(match name {
        "ENTYPE" | "VERSION" | "INITCNT" => Int,
        "AUTHOR" => Char,
        "AUTHDATE" | "LJDATE" | "REVOKEDT" | "RESUMEDT" => Date,
        "LJTIME" => Time,
        "UACC" | "FLAG1" | "FLAG2" | "FLAG3" | "FLAG4" | "FLAG5" => Flag,
        "NOTRMUAC" | "GRPAUDIT" => Bin,
        _ => return None,
    })
}

fn dataset_field(name: &str) -> Option<CatalogType> {
    use CatalogType::*;
    Some(match name {
        "ENTYPE" | "VERSION" | "ACSALTR" | "ACSCNTL" | "ACSUPDT" | "ACSREAD" | "LEVEL"
        | "SECLEVEL" | "NUMCTGY" | "RETPD" | "ACL2CNT" | "PACSCNT" | "FLDCNT" | "VOLCNT"
        | "ACLCNT" | "ACSCNT" | "USRCNT" | "ROLEN" | "CSCNT" => Int,
        "AUTHOR" | "GROUPNM" | "DEVTYPX" | "INSTDATA" | "NOTIFY" | "PROGRAM" | "USER2ACS"
        | "ACL2VAR" | "FLDNAME" | "VOLSER" | "USERID" | "USRNM" | "SECLABEL" | "RESOWNER"
        | "DATAKEY" | "ROLES" | "CSKEY" | "CSVALUE" => Char,
        "CREADATE" | "LREFDAT" | "LCHGDAT" => Date,
        "UNIVACS" | "FLAG1" | "AUDIT" | "DSTYPE" | "GAUDIT" | "GAUDITQF" | "WARNING"
        | "FLDFLAG" | "USERACS" | "USRFLG" | "CSTYPE" => Flag,
        "DEVTYP" | "AUDITQS" | "AUDITQF" | "GAUDITQS" | "CATEGORY" | "PROGACS" | "FLDVALUE"
        | "USRDATA" => Bin,
        _ => return None,
    })
}

fn general_field(name: &str) -> Option<CatalogType> {
    use CatalogType::*;
    Some(match name {
        "ENTYPE" | "VERSION" | "CLASTYPE" | "ACSALTR" | "ACSCNTL" | "ACSUPDT" | "ACSREAD"
        | "LEVEL" | "TVTOCCNT" | "TVTOCSEQ" | "NUMCTGY" | "CATEGORY" | "SECLEVEL" | "FLDCNT"
        | "MEMCNT" | "VOLCNT" | "ACLCNT" | "ACSCNT" | "USRCNT" | "ACL2CNT" | "ACL2ACNT"
        | "FILTERCT" | "DIDCT" | "KEYINTVL" | "SLSFAIL" | "MAXFAIL" | "SENTCNT" | "SENTFLCT"
        | "JOBNMCNT" | "PTTIMEO" | "RINGCT" | "CERTCT" | "CERTPRVS" | "RINGSEQN" | "CHILDN"
        | "RESN" | "GROUPN" | "ROLEN" | "CDTPOSIT" | "CDTMAXLN" | "CDTMAXLX" | "CDTDFTRC"
        | "CDTKEYQL" | "MAPTIMEO" | "CFMXLEN" | "CFMXVAL" | "CFMNVAL" | "CSFSKLCT"
        | "CSFSCLCT" | "MFFCTRN" | "MFTIMEO" | "CSCNT" | "IDTTIMEO" => Int,
        "OWNER" | "INSTDATA" | "TVTOCDSN" | "TVTOCVOL" | "TVTOCRDS" | "NOTIFY" | "FLDNAME"
        | "APPLDATA" | "VOLSER" | "USERID" | "USRNM" | "SECLABEL" | "ACL2NAME" | "ACL2UID"
        | "RACLHDR" | "RACLDSP" | "FLTRLABL" | "FLTRUSER" | "FLTRNAME" | "DIDLABL"
        | "DIDUSER" | "DIDRNAME" | "SENTITY" | "JOBNAMES" | "PTKEYLAB" | "PTTYPE" | "STUSER"
        | "STGROUP" | "SCRIPTN" | "PARMN" | "RINGNAME" | "CERTSTRT" | "CERTEND" | "CERTNAME"
        | "CERTLABL" | "CERTRSV1" | "CERTRSV2" | "CERTRSV3" | "CERTRSV4" | "CERTRSV5"
        | "CERTRSV6" | "CERTRSV7" | "CERTRSV8" | "CERTRSV9" | "CERTRSVA" | "CERTRSVB"
        | "CERTRSVC" | "CERTRSVD" | "CERTRSVE" | "CERTRSVF" | "CERTRSVG" | "CERTRSVH"
        | "CERTRSVI" | "CERTRSVJ" | "CERTRSVK" | "PARENT" | "CHILDREN" | "RESOURCE"
        | "GROUPS" | "ROLES" | "KERBNAME" | "MINTKTLF" | "MAXTKTLF" | "DEFTKTLF" | "SALT"
        | "ENCTYPE" | "CURKEYV" | "CURKEY" | "PREVKEYV" | "PREVKEY" | "ENCRYPT" | "CHKADDRS"
        | "LDAPHOST" | "BINDDN" | "BINDPW" | "BINDPWKY" | "DOMAINDN" | "OPTIONS"
        | "LOCALREG" | "KERBREG" | "X509REG" | "IPLOOK" | "CDTGROUP" | "CDTMEMBR" | "CFHELP"
        | "CFLIST" | "CFVALRX" | "CSFSKLBS" | "CSFSCLBS" | "MFDATA" | "MFFCTRS" | "CSKEY"
        | "CSVALUE" | "IDTTOKN" | "IDTSEQN" | "IDTCAT" | "IDTSALG" | "IDTANYAP" => Char,
        "DEFDATE" | "LREFDAT" | "LCHGDAT" | "TVTOCCRD" | "KEYDATE" => Date,
        "LOGTIME" => Time,
        "UACC" | "AUDIT" | "GAUDIT" | "GAUDITQF" | "AUDITQS" | "AUDITQF" | "GAUDITQS"
        | "WARNING" | "RESFLG" | "TVTOCIND" | "LOGDAYS" | "FLDFLAG" | "USERACS" | "USRFLG"
        | "SLSFLAGS" | "CONVSEC" | "RETAIN" | "FLAGTRUS" | "FLAGPRIV" | "FLAGTRAC"
        | "CERTDFLT" | "CDTFIRST" | "CDTOTHER" | "CDTOPER" | "CDTUACC" | "CDTRACL"
        | "CDTGENL" | "CDTPRFAL" | "CDTSLREQ" | "CDTMAC" | "CDTSIGL" | "CDTCASE" | "CDTGEN"
        | "USEMAP" | "DOMAP" | "MAPREQ" | "CFDTYPE" | "CFFIRST" | "CFOTHER" | "CFMIXED"
        | "SIGREQD" | "FAILLOAD" | "SIGAUDIT" | "CSFSEXP" | "CSFAUSE" | "CSFSCPW"
        | "CSFSCPR" => Flag,
        "LOGZONE" | "FLDVALUE" | "MEMLST" | "ACL2ACC" | "ACL2RSVD" | "FLTRSVD1" | "FLTRSVD2"
        | "FLTRSVD3" | "FLTRSVD4" | "FLTRSVD5" | "RACDHDR" | "DIDRSVD1" | "DIDRSVD2"
        | "SESSKEY" | "SSKEY" | "PTREPLAY" | "CERT" | "CERTPRVK" | "CERTUSAG" | "CERTSJDN"
        | "CERTPRVT" | "CERTLSER" | "CERTGREQ" | "MFREUSE" => Bin,
        _ => return None,
    })
}
